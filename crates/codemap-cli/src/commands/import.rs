//! `codemap import`: materialize an analysis document under a project.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::Args;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;

use codemap_core::analysis::load_analysis;
use codemap_core::ProjectStatus;
use codemap_graph::{import_analysis, initialize_schema, set_project_status, GraphClient};

use crate::config::AppConfig;
use crate::output;

#[derive(Args)]
pub struct ImportArgs {
    /// Analysis JSON document
    pub file: PathBuf,

    /// Project (tenant) id that will own the imported nodes
    #[arg(long)]
    pub project_id: String,

    /// Display name for a newly created project (defaults to the id)
    #[arg(long)]
    pub project_name: Option<String>,

    /// Create constraints and indexes before importing
    #[arg(long)]
    pub init_schema: bool,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn execute(args: ImportArgs, client: &GraphClient, config: &AppConfig) -> Result<()> {
    let analysis = load_analysis(&args.file)?;
    let stats = analysis.stats();
    let project_name = args.project_name.as_deref().unwrap_or(&args.project_id);

    if args.init_schema {
        let applied = initialize_schema(client).await?;
        println!("{} {} schema statements", "Applied".green(), applied);
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg} [{elapsed}]")?);
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner.set_message(format!(
        "Importing {} files, {} functions, {} classes into {}",
        stats.files, stats.functions, stats.classes, args.project_id
    ));

    let deadline = config.query.import_timeout();
    let outcome = tokio::time::timeout(
        deadline,
        import_analysis(client, &analysis, &args.project_id, project_name),
    )
    .await;
    spinner.finish_and_clear();

    let report = match outcome {
        Ok(Ok(report)) => report,
        Ok(Err(err)) => {
            mark_failed(client, &args.project_id).await;
            return Err(err.into());
        }
        Err(_) => {
            mark_failed(client, &args.project_id).await;
            bail!("Import timed out after {}s", deadline.as_secs());
        }
    };

    set_project_status(client, &args.project_id, ProjectStatus::Completed).await?;

    if args.json {
        output::print_json(&report)?;
    } else {
        output::print_import_report(&report, &args.project_id);
    }
    Ok(())
}

/// Record the failure on the Project node, if the import got far enough to create it.
async fn mark_failed(client: &GraphClient, project_id: &str) {
    if project_id.trim().is_empty() {
        return;
    }
    if let Err(err) = set_project_status(client, project_id, ProjectStatus::Failed).await {
        warn!(project_id, error = %err, "Could not mark project as failed");
    }
}
