//! Result shape classification.
//!
//! A result holding any node or relationship (at any nesting depth) is a
//! graph result and is canonicalized into `{nodes, edges}`; anything else
//! is passed through as a table.

use std::collections::HashSet;

use serde::Serialize;
use serde_json::{json, Value};

use crate::statement::Properties;
use crate::value::{GraphValue, NodeValue, Record, RelationshipValue};

/// Fields the canonical shape owns. Domain properties with these names are
/// re-emitted with a `domain_` prefix.
const CANONICAL_FIELDS: [&str; 5] = ["id", "label", "type", "source", "target"];

/// Canonical visualization shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GraphResult {
    pub nodes: Vec<Properties>,
    pub edges: Vec<Properties>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryResult {
    Graph(GraphResult),
    Table(Vec<Record>),
}

impl QueryResult {
    pub fn is_graph(&self) -> bool {
        matches!(self, QueryResult::Graph(_))
    }
}

/// Classify and canonicalize a set of result rows.
pub fn classify(rows: Vec<Record>) -> QueryResult {
    let is_graph = rows
        .iter()
        .any(|row| row.values().any(GraphValue::contains_graph_element));
    if !is_graph {
        return QueryResult::Table(rows);
    }

    let mut collector = Collector::default();
    for row in &rows {
        for value in row.values() {
            collector.visit(value);
        }
    }
    QueryResult::Graph(collector.result)
}

#[derive(Default)]
struct Collector {
    seen_nodes: HashSet<String>,
    seen_edges: HashSet<String>,
    result: GraphResult,
}

impl Collector {
    fn visit(&mut self, value: &GraphValue) {
        match value {
            GraphValue::Node(node) => {
                if self.seen_nodes.insert(node.element_id.clone()) {
                    self.result.nodes.push(canonical_node(node));
                }
            }
            GraphValue::Relationship(rel) => {
                if self.seen_edges.insert(rel.element_id.clone()) {
                    self.result.edges.push(canonical_edge(rel));
                }
            }
            GraphValue::List(items) => items.iter().for_each(|item| self.visit(item)),
            GraphValue::Map(entries) => entries.values().for_each(|item| self.visit(item)),
            GraphValue::Scalar(_) => {}
        }
    }
}

fn canonical_node(node: &NodeValue) -> Properties {
    let label = node.labels.first().cloned().unwrap_or_default();
    let mut out = Properties::new();
    out.insert("id".to_string(), json!(node.element_id));
    out.insert("label".to_string(), json!(label));
    out.insert("type".to_string(), json!(label));
    if let Some(name) = node.properties.get("name") {
        out.insert("name".to_string(), name.clone());
    }
    merge_domain(&mut out, &node.properties);
    out
}

fn canonical_edge(rel: &RelationshipValue) -> Properties {
    let mut out = Properties::new();
    out.insert("id".to_string(), json!(rel.element_id));
    out.insert("source".to_string(), json!(rel.start_id));
    out.insert("target".to_string(), json!(rel.end_id));
    out.insert("label".to_string(), json!(rel.rel_type));
    out.insert("type".to_string(), json!(rel.rel_type));
    merge_domain(&mut out, &rel.properties);
    out
}

fn merge_domain(out: &mut Properties, properties: &Properties) {
    for (key, value) in properties {
        if key == "name" {
            continue;
        }
        let key = if CANONICAL_FIELDS.contains(&key.as_str()) {
            format!("domain_{key}")
        } else {
            key.clone()
        };
        out.insert(key, value.clone());
    }
}

/// Render a classified result as JSON.
pub fn to_json(result: &QueryResult) -> Value {
    serde_json::to_value(result).unwrap_or(Value::Null)
}
