//! `codemap overview`: dashboard queries over the code graph.

use anyhow::Result;
use clap::{Args, Subcommand};

use codemap_graph::queries::overview::DEFAULT_TOP_NODES;
use codemap_graph::{GraphClient, Overview};

use crate::config::AppConfig;
use crate::output;

#[derive(Args, Clone, Default)]
pub struct OverviewScope {
    /// Only consider this project's nodes
    #[arg(long)]
    pub project_id: Option<String>,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum OverviewCommands {
    /// Node counts per label
    Summary {
        #[command(flatten)]
        scope: OverviewScope,
    },

    /// Files with the number of items they contain
    Files {
        #[command(flatten)]
        scope: OverviewScope,
    },

    /// Most connected nodes
    Top {
        /// Only nodes with this label (File, Function, Class, ...)
        #[arg(long)]
        label: Option<String>,
        /// Maximum number of nodes
        #[arg(long, default_value_t = DEFAULT_TOP_NODES)]
        limit: i64,
        #[command(flatten)]
        scope: OverviewScope,
    },

    /// One node and its connections
    Node {
        /// Element id, domain id, name or file path
        id: String,
        #[command(flatten)]
        scope: OverviewScope,
    },
}

pub async fn execute(cmd: OverviewCommands, client: &GraphClient, config: &AppConfig) -> Result<()> {
    let overview = |scope: &OverviewScope| {
        Overview::new(client)
            .for_project(scope.project_id.clone())
            .with_timeout(config.query.overview_timeout())
    };

    match cmd {
        OverviewCommands::Summary { scope } => {
            let summary = overview(&scope).graph_summary().await?;
            if scope.json {
                output::print_json(&summary)?;
            } else {
                output::print_summary(&summary);
            }
        }
        OverviewCommands::Files { scope } => {
            let files = overview(&scope).file_hierarchy().await?;
            if scope.json {
                output::print_json(&files)?;
            } else {
                output::print_files(&files);
            }
        }
        OverviewCommands::Top { label, limit, scope } => {
            let nodes = overview(&scope).top_nodes(label.as_deref(), limit).await?;
            if scope.json {
                output::print_json(&nodes)?;
            } else {
                output::print_top_nodes(&nodes);
            }
        }
        OverviewCommands::Node { id, scope } => {
            let details = overview(&scope).node_details(&id).await?;
            output::print_json(&details)?;
        }
    }
    Ok(())
}
