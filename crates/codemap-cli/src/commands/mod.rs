//! CLI command definitions and handlers.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use codemap_graph::GraphClient;

use crate::config::{AppConfig, ConnectionOverrides};

pub mod graph;
pub mod import;
pub mod overview;
pub mod query;

/// Codemap - multi-tenant code graph over Neo4j
#[derive(Parser)]
#[command(name = "codemap")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a TOML config file
    #[arg(short, long, global = true, env = "CODEMAP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Also write logs to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Neo4j connection settings.
#[derive(Args, Debug, Clone, Default)]
pub struct ConnectionArgs {
    /// Neo4j bolt URI
    #[arg(long, global = true, env = "NEO4J_URI")]
    pub neo4j_uri: Option<String>,

    /// Neo4j user
    #[arg(long, global = true, env = "NEO4J_USER")]
    pub neo4j_user: Option<String>,

    /// Neo4j password
    #[arg(long, global = true, env = "NEO4J_PASSWORD", hide_env_values = true)]
    pub neo4j_password: Option<String>,

    /// Neo4j database name
    #[arg(long, global = true, env = "NEO4J_DATABASE")]
    pub neo4j_database: Option<String>,
}

impl From<ConnectionArgs> for ConnectionOverrides {
    fn from(args: ConnectionArgs) -> Self {
        Self {
            uri: args.neo4j_uri,
            user: args.neo4j_user,
            password: args.neo4j_password,
            database: args.neo4j_database,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Import an analysis document into the graph
    Import(import::ImportArgs),

    /// Run a read query, optionally scoped to a project
    Query(query::QueryArgs),

    /// Dashboard overview queries
    #[command(subcommand)]
    Overview(overview::OverviewCommands),

    /// Create constraints and indexes
    Schema,

    /// Show node and relationship counts
    Status {
        /// Only count this project's nodes
        #[arg(long)]
        project_id: Option<String>,
    },
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let config = AppConfig::load(self.config.as_deref())?.apply(self.connection.into());
        let client = GraphClient::connect(&config.graph).await?;

        match self.command {
            Commands::Import(args) => import::execute(args, &client, &config).await,
            Commands::Query(args) => query::execute(args, &client, &config).await,
            Commands::Overview(cmd) => overview::execute(cmd, &client, &config).await,
            Commands::Schema => graph::cmd_schema(&client).await,
            Commands::Status { project_id } => graph::cmd_status(&client, &config, project_id).await,
        }
    }
}
