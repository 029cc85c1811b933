//! Graph maintenance commands.

use anyhow::Result;
use colored::Colorize;

use codemap_graph::{initialize_schema, GraphClient, Overview};

use crate::config::AppConfig;
use crate::output;

/// Create constraints and indexes.
pub async fn cmd_schema(client: &GraphClient) -> Result<()> {
    println!("{}", "Initializing schema...".bold());
    let applied = initialize_schema(client).await?;
    println!("{} {} statements applied", "Schema ready:".green().bold(), applied);
    Ok(())
}

/// Show node and relationship counts, optionally for one project.
pub async fn cmd_status(client: &GraphClient, config: &AppConfig, project_id: Option<String>) -> Result<()> {
    let counts = Overview::new(client)
        .for_project(project_id.clone())
        .with_timeout(config.query.overview_timeout())
        .graph_counts()
        .await?;

    output::print_counts(&counts, project_id.as_deref());
    Ok(())
}
