//! Dynamically-shaped query result values.

use std::collections::BTreeMap;

use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::statement::Properties;

/// A node as returned by the graph store.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeValue {
    /// The store's stable identity for this node.
    pub element_id: String,
    pub labels: Vec<String>,
    pub properties: Properties,
}

/// A relationship as returned by the graph store.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipValue {
    pub element_id: String,
    pub rel_type: String,
    pub start_id: String,
    pub end_id: String,
    pub properties: Properties,
}

/// One value in a result row.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphValue {
    Node(NodeValue),
    Relationship(RelationshipValue),
    List(Vec<GraphValue>),
    Map(BTreeMap<String, GraphValue>),
    Scalar(Value),
}

/// One result row: return-column name to value.
pub type Record = BTreeMap<String, GraphValue>;

impl GraphValue {
    pub fn null() -> Self {
        GraphValue::Scalar(Value::Null)
    }

    /// The string inside a scalar, if any.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            GraphValue::Scalar(Value::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            GraphValue::Scalar(value) => value.as_i64(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            GraphValue::Scalar(Value::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    /// Whether this value, or anything nested in it, is a node or relationship.
    pub fn contains_graph_element(&self) -> bool {
        match self {
            GraphValue::Node(_) | GraphValue::Relationship(_) => true,
            GraphValue::List(items) => items.iter().any(GraphValue::contains_graph_element),
            GraphValue::Map(entries) => entries.values().any(GraphValue::contains_graph_element),
            GraphValue::Scalar(_) => false,
        }
    }

    /// Plain JSON rendering used for tabular output.
    pub fn to_json(&self) -> Value {
        match self {
            GraphValue::Node(node) => serde_json::json!({
                "element_id": node.element_id,
                "labels": node.labels,
                "properties": node.properties,
            }),
            GraphValue::Relationship(rel) => serde_json::json!({
                "element_id": rel.element_id,
                "type": rel.rel_type,
                "start_id": rel.start_id,
                "end_id": rel.end_id,
                "properties": rel.properties,
            }),
            GraphValue::List(items) => Value::Array(items.iter().map(GraphValue::to_json).collect()),
            GraphValue::Map(entries) => {
                Value::Object(entries.iter().map(|(k, v)| (k.clone(), v.to_json())).collect())
            }
            GraphValue::Scalar(value) => value.clone(),
        }
    }
}

impl From<Value> for GraphValue {
    fn from(value: Value) -> Self {
        GraphValue::Scalar(value)
    }
}

impl From<&str> for GraphValue {
    fn from(value: &str) -> Self {
        GraphValue::Scalar(Value::String(value.to_string()))
    }
}

impl Serialize for GraphValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// Read an integer column from a record, defaulting to zero.
pub fn record_i64(record: &Record, column: &str) -> i64 {
    record.get(column).and_then(GraphValue::as_i64).unwrap_or_default()
}

/// Read a string column from a record.
pub fn record_str<'a>(record: &'a Record, column: &str) -> Option<&'a str> {
    record.get(column).and_then(GraphValue::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node(id: &str) -> GraphValue {
        GraphValue::Node(NodeValue {
            element_id: id.to_string(),
            labels: vec!["Function".to_string()],
            properties: Properties::new(),
        })
    }

    #[test]
    fn test_nested_graph_element_detection() {
        assert!(node("1").contains_graph_element());
        assert!(!GraphValue::from(json!(3)).contains_graph_element());

        let nested = GraphValue::List(vec![GraphValue::Map(BTreeMap::from([
            ("node".to_string(), node("7")),
            ("relationship".to_string(), GraphValue::null()),
        ]))]);
        assert!(nested.contains_graph_element());

        let scalars = GraphValue::List(vec![GraphValue::from("a"), GraphValue::null()]);
        assert!(!scalars.contains_graph_element());
    }

    #[test]
    fn test_serializes_as_plain_json() {
        let row: Record = BTreeMap::from([
            ("nodeType".to_string(), GraphValue::from("Function")),
            ("count".to_string(), GraphValue::from(json!(12))),
        ]);
        let rendered = serde_json::to_value(&row).unwrap();
        assert_eq!(rendered, json!({"count": 12, "nodeType": "Function"}));
    }

    #[test]
    fn test_record_str() {
        let row: Record = BTreeMap::from([("path".to_string(), GraphValue::from("a.js"))]);
        assert_eq!(record_str(&row, "path"), Some("a.js"));
        assert_eq!(record_str(&row, "missing"), None);
    }
}
