//! Conversion between bolt values and Codemap's JSON/graph values.

use std::collections::BTreeMap;

use neo4rs::{
    BoltBoolean, BoltFloat, BoltInteger, BoltList, BoltMap, BoltNode, BoltNull, BoltPath, BoltString, BoltType,
    Query, Row,
};
use serde_json::{Number, Value};
use tracing::warn;

use crate::statement::{Properties, Statement};
use crate::value::{GraphValue, NodeValue, Record, RelationshipValue};

/// Render a statement as a parameterized neo4rs query.
pub(crate) fn to_query(statement: &Statement) -> Query {
    statement
        .params()
        .iter()
        .fold(Query::new(statement.text()), |query, (key, value)| {
            query.param(key, json_to_bolt(value))
        })
}

pub(crate) fn json_to_bolt(value: &Value) -> BoltType {
    match value {
        Value::Null => BoltType::Null(BoltNull),
        Value::Bool(b) => BoltType::Boolean(BoltBoolean::new(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => BoltType::Integer(BoltInteger::new(i)),
            None => BoltType::Float(BoltFloat::new(n.as_f64().unwrap_or_default())),
        },
        Value::String(s) => BoltType::String(BoltString::new(s)),
        Value::Array(items) => {
            let mut list = BoltList::with_capacity(items.len());
            for item in items {
                list.push(json_to_bolt(item));
            }
            BoltType::List(list)
        }
        Value::Object(entries) => {
            let mut map = BoltMap::with_capacity(entries.len());
            for (key, item) in entries {
                map.put(BoltString::new(key), json_to_bolt(item));
            }
            BoltType::Map(map)
        }
    }
}

pub(crate) fn bolt_to_value(value: &BoltType) -> GraphValue {
    match value {
        BoltType::Null(_) => GraphValue::null(),
        BoltType::Boolean(b) => GraphValue::Scalar(Value::Bool(b.value)),
        BoltType::Integer(i) => GraphValue::Scalar(Value::from(i.value)),
        BoltType::Float(f) => GraphValue::Scalar(Number::from_f64(f.value).map(Value::Number).unwrap_or(Value::Null)),
        BoltType::String(s) => GraphValue::Scalar(Value::String(s.value.clone())),
        BoltType::List(list) => GraphValue::List(list.value.iter().map(bolt_to_value).collect()),
        BoltType::Map(map) => GraphValue::Map(
            map.value
                .iter()
                .map(|(k, v)| (k.value.clone(), bolt_to_value(v)))
                .collect(),
        ),
        BoltType::Node(node) => node_value(node),
        BoltType::Relation(rel) => GraphValue::Relationship(RelationshipValue {
            element_id: rel.id.value.to_string(),
            rel_type: rel.typ.value.clone(),
            start_id: rel.start_node_id.value.to_string(),
            end_id: rel.end_node_id.value.to_string(),
            properties: bolt_properties(&rel.properties),
        }),
        BoltType::Path(path) => path_value(path),
        // Temporal, spatial and byte values have no canonical JSON shape.
        other => GraphValue::Scalar(Value::String(format!("{other:?}"))),
    }
}

fn node_value(node: &BoltNode) -> GraphValue {
    GraphValue::Node(NodeValue {
        element_id: node.id.value.to_string(),
        labels: node
            .labels
            .value
            .iter()
            .filter_map(|label| match label {
                BoltType::String(s) => Some(s.value.clone()),
                _ => None,
            })
            .collect(),
        properties: bolt_properties(&node.properties),
    })
}

/// Flatten a path into `[node, rel, node, ...]`.
///
/// Path relationships carry no endpoints. The `indices` list alternates a
/// 1-based relationship index (negative when traversed against its
/// direction) with the index of the next node.
fn path_value(path: &BoltPath) -> GraphValue {
    let nodes = path.nodes();
    let rels = path.rels();
    let indices: Vec<i64> = path.indices().iter().map(|i| i.value).collect();

    let Some(first) = nodes.first() else {
        return GraphValue::List(Vec::new());
    };
    let mut items = vec![node_value(first)];
    let mut current = first;

    for step in indices.chunks_exact(2) {
        let (rel_index, node_index) = (step[0], step[1]);
        let rel = usize::try_from(rel_index.unsigned_abs())
            .ok()
            .and_then(|i| i.checked_sub(1))
            .and_then(|i| rels.get(i));
        let next = usize::try_from(node_index).ok().and_then(|i| nodes.get(i));
        let (Some(rel), Some(next)) = (rel, next) else {
            break;
        };

        let (start, end) = if rel_index > 0 { (current, next) } else { (next, current) };
        items.push(GraphValue::Relationship(RelationshipValue {
            element_id: rel.id.value.to_string(),
            rel_type: rel.typ.value.clone(),
            start_id: start.id.value.to_string(),
            end_id: end.id.value.to_string(),
            properties: bolt_properties(&rel.properties),
        }));
        items.push(node_value(next));
        current = next;
    }

    GraphValue::List(items)
}

fn bolt_properties(map: &BoltMap) -> Properties {
    map.value
        .iter()
        .map(|(k, v)| (k.value.clone(), bolt_to_value(v).to_json()))
        .collect()
}

/// Convert a result row into a column map.
///
/// A row that cannot be read column by column (which neo4rs only reports
/// for malformed data) yields an empty record.
pub(crate) fn row_to_record(row: &Row) -> Record {
    match row.to_strict::<BTreeMap<String, BoltType>>() {
        Ok(columns) => columns
            .iter()
            .map(|(column, value)| (column.clone(), bolt_to_value(value)))
            .collect(),
        Err(err) => {
            warn!(error = %err, "Unreadable result row");
            Record::new()
        }
    }
}
