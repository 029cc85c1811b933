//! Dashboard overview queries.
//!
//! Fixed read queries over the code graph. Each runs through the query
//! gateway, so a project id scopes it the same way as ad-hoc queries.

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use codemap_core::{CodemapError, CodemapResult};

use crate::client::GraphCounts;
use crate::query::classify::QueryResult;
use crate::query::{execute, execute_classified, QueryRequest};
use crate::store::GraphStore;
use crate::value::{record_i64, record_str, GraphValue, Record};

const SUMMARY_QUERY: &str = "MATCH (n) \
     WITH labels(n)[0] AS nodeType, count(n) AS count \
     RETURN nodeType, count \
     ORDER BY count DESC";

const FILE_HIERARCHY_QUERY: &str = "MATCH (f:File) \
     OPTIONAL MATCH (f)-[:CONTAINS]->(content) \
     WITH f, count(content) AS itemCount, collect(labels(content)[0]) AS contentTypes \
     RETURN f.path AS path, f.language AS language, itemCount, contentTypes \
     ORDER BY path \
     LIMIT 100";

const TOP_NODES_QUERY: &str = "MATCH (n)-[r]-() \
     WITH n, count(r) AS connections \
     RETURN n, connections \
     ORDER BY connections DESC \
     LIMIT $limit";

const TOP_NODES_BY_LABEL_QUERY: &str = "MATCH (n) \
     WHERE $nodeType IN labels(n) \
     OPTIONAL MATCH (n)-[r]-() \
     WITH n, count(r) AS connections \
     WHERE connections > 0 \
     RETURN n, connections \
     ORDER BY connections DESC \
     LIMIT $limit";

const NODE_DETAILS_QUERY: &str = "MATCH (n) \
     WHERE elementId(n) = $nodeId OR n.id = $nodeId OR n.name = $nodeId OR n.path = $nodeId \
     OPTIONAL MATCH (n)-[r]-(connected) \
     RETURN n, collect({relationship: r, node: connected}) AS connections \
     LIMIT 1";

const COUNTS_QUERY: &str = "MATCH (n) \
     OPTIONAL MATCH (n)-[r]->() \
     RETURN count(DISTINCT n) AS nodes, count(r) AS relationships";

/// Deadline for the summary and node detail queries.
pub const DETAIL_TIMEOUT: Duration = Duration::from_secs(10);
/// Deadline for the listing queries.
pub const LISTING_TIMEOUT: Duration = Duration::from_secs(15);

/// Default number of nodes returned by [`Overview::top_nodes`].
pub const DEFAULT_TOP_NODES: i64 = 20;

/// Node count for one label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelCount {
    pub label: String,
    pub count: i64,
}

/// One file with a summary of what it contains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    pub path: String,
    pub language: String,
    pub item_count: i64,
    pub content_types: Vec<String>,
}

/// A node ranked by its number of relationships.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopNode {
    pub id: String,
    pub label: String,
    pub name: String,
    pub connections: i64,
}

/// Overview queries, optionally scoped to one project.
pub struct Overview<'a> {
    store: &'a dyn GraphStore,
    project_id: Option<String>,
    timeout: Option<Duration>,
}

impl<'a> Overview<'a> {
    pub fn new(store: &'a dyn GraphStore) -> Self {
        Self { store, project_id: None, timeout: None }
    }

    pub fn for_project(mut self, project_id: Option<String>) -> Self {
        self.project_id = project_id.filter(|id| !id.is_empty());
        self
    }

    /// Replace the per-query default deadlines.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn request(&self, text: &str, default_timeout: Duration) -> QueryRequest {
        let request = QueryRequest::new(text).with_timeout(self.timeout.unwrap_or(default_timeout));
        match &self.project_id {
            Some(project_id) => request.for_tenant(project_id.as_str()),
            None => request,
        }
    }

    /// Node counts by first label, largest first.
    pub async fn graph_summary(&self) -> CodemapResult<Vec<LabelCount>> {
        let rows = execute(self.store, &self.request(SUMMARY_QUERY, DETAIL_TIMEOUT)).await?;
        Ok(rows
            .iter()
            .map(|row| LabelCount {
                label: record_str(row, "nodeType").unwrap_or_default().to_string(),
                count: record_i64(row, "count"),
            })
            .collect())
    }

    /// Files in path order with their contained item counts.
    pub async fn file_hierarchy(&self) -> CodemapResult<Vec<FileEntry>> {
        let rows = execute(self.store, &self.request(FILE_HIERARCHY_QUERY, LISTING_TIMEOUT)).await?;
        Ok(rows.iter().map(file_entry).collect())
    }

    /// The most connected nodes, optionally only those with `label`.
    pub async fn top_nodes(&self, label: Option<&str>, limit: i64) -> CodemapResult<Vec<TopNode>> {
        let limit = if limit > 0 { limit } else { DEFAULT_TOP_NODES };
        let request = match label.filter(|l| !l.is_empty()) {
            Some(label) => self
                .request(TOP_NODES_BY_LABEL_QUERY, LISTING_TIMEOUT)
                .with_param("nodeType", label),
            None => self.request(TOP_NODES_QUERY, LISTING_TIMEOUT),
        }
        .with_param("limit", limit);

        let rows = execute(self.store, &request).await?;
        Ok(rows.iter().filter_map(top_node).collect())
    }

    /// One node, matched by element id, domain id, name or path, with its
    /// connections. Returned in the canonical graph shape.
    pub async fn node_details(&self, node_id: &str) -> CodemapResult<QueryResult> {
        if node_id.is_empty() {
            return Err(CodemapError::QueryExecutionFailure("node id is required".to_string()));
        }
        let request = self
            .request(NODE_DETAILS_QUERY, DETAIL_TIMEOUT)
            .with_param("nodeId", node_id);
        execute_classified(self.store, &request).await
    }

    /// Node and relationship totals.
    pub async fn graph_counts(&self) -> CodemapResult<GraphCounts> {
        let rows = execute(self.store, &self.request(COUNTS_QUERY, DETAIL_TIMEOUT)).await?;
        Ok(rows
            .first()
            .map(|row| GraphCounts {
                nodes: record_i64(row, "nodes").max(0) as usize,
                relationships: record_i64(row, "relationships").max(0) as usize,
            })
            .unwrap_or_default())
    }
}

fn file_entry(row: &Record) -> FileEntry {
    let content_types = match row.get("contentTypes") {
        Some(GraphValue::List(items)) => items
            .iter()
            .filter_map(GraphValue::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    };
    FileEntry {
        path: record_str(row, "path").unwrap_or_default().to_string(),
        language: record_str(row, "language").unwrap_or_default().to_string(),
        item_count: record_i64(row, "itemCount"),
        content_types,
    }
}

fn top_node(row: &Record) -> Option<TopNode> {
    let GraphValue::Node(node) = row.get("n")? else {
        return None;
    };
    let text = |key: &str| node.properties.get(key).and_then(Value::as_str).map(str::to_string);
    let id = text("id").or_else(|| text("path")).unwrap_or_else(|| node.element_id.clone());
    let name = text("name").or_else(|| text("path")).unwrap_or_else(|| id.clone());

    Some(TopNode {
        label: node.labels.first().cloned().unwrap_or_default(),
        id,
        name,
        connections: record_i64(row, "connections"),
    })
}
