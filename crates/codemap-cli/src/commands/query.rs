//! `codemap query`: run an ad-hoc read query.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde_json::Value;

use codemap_graph::{classify, execute as run_query, GraphClient, Properties, QueryRequest, QueryResult};

use crate::config::AppConfig;
use crate::output;

#[derive(Args)]
pub struct QueryArgs {
    /// Cypher read query
    pub cypher: String,

    /// Scope the query to this project
    #[arg(long)]
    pub project_id: Option<String>,

    /// Query parameters as a JSON object
    #[arg(long)]
    pub params: Option<String>,

    /// Deadline in seconds (overrides config)
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Print rows without graph classification
    #[arg(long)]
    pub raw: bool,
}

pub async fn execute(args: QueryArgs, client: &GraphClient, config: &AppConfig) -> Result<()> {
    let timeout = args
        .timeout
        .map(Duration::from_secs)
        .unwrap_or_else(|| config.query.query_timeout());

    let mut request = QueryRequest::new(args.cypher.as_str())
        .with_params(parse_params(args.params.as_deref())?)
        .with_timeout(timeout);
    if let Some(project_id) = args.project_id {
        request = request.for_tenant(project_id);
    }

    let rows = run_query(client, &request).await?;

    if args.raw {
        return output::print_json(&rows);
    }

    let result = classify(rows);
    match &result {
        QueryResult::Graph(graph) if graph.nodes.is_empty() && graph.edges.is_empty() => {
            println!("{}", "No results.".dimmed());
        }
        QueryResult::Table(rows) if rows.is_empty() => {
            println!("{}", "No results.".dimmed());
        }
        _ => output::print_json(&result)?,
    }
    Ok(())
}

/// Parse `--params` into a parameter map.
fn parse_params(raw: Option<&str>) -> Result<Properties> {
    let Some(raw) = raw else {
        return Ok(Properties::new());
    };
    match serde_json::from_str::<Value>(raw).context("--params must be valid JSON")? {
        Value::Object(map) => Ok(map),
        other => anyhow::bail!("--params must be a JSON object, got {other}"),
    }
}
