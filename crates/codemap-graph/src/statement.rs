//! Typed, parameterized graph statements.
//!
//! Write statements are built from closed label and relationship enums and
//! always pass values as parameters, so no caller-controlled text is ever
//! spliced into write Cypher. Free-form read queries use [`Statement::Cypher`].

use serde_json::{json, Value};

/// Property/parameter map.
pub type Properties = serde_json::Map<String, Value>;

/// Node kinds in the code graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeLabel {
    Project,
    File,
    Class,
    Property,
    Function,
    Parameter,
    Import,
    ExternalDependency,
    ReturnType,
}

impl NodeLabel {
    pub const ALL: [NodeLabel; 9] = [
        NodeLabel::Project,
        NodeLabel::File,
        NodeLabel::Class,
        NodeLabel::Property,
        NodeLabel::Function,
        NodeLabel::Parameter,
        NodeLabel::Import,
        NodeLabel::ExternalDependency,
        NodeLabel::ReturnType,
    ];

    /// The Neo4j node label.
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeLabel::Project => "Project",
            NodeLabel::File => "File",
            NodeLabel::Class => "Class",
            NodeLabel::Property => "Property",
            NodeLabel::Function => "Function",
            NodeLabel::Parameter => "Parameter",
            NodeLabel::Import => "Import",
            NodeLabel::ExternalDependency => "ExternalDependency",
            NodeLabel::ReturnType => "ReturnType",
        }
    }

    /// The property holding this label's identity key.
    pub fn key_property(&self) -> &'static str {
        match self {
            NodeLabel::File => "path",
            NodeLabel::ExternalDependency | NodeLabel::ReturnType => "name",
            _ => "id",
        }
    }
}

/// Relationship kinds in the code graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RelType {
    BelongsTo,
    Contains,
    HasProperty,
    HasParameter,
    HasImport,
    Imports,
    DependsOn,
    HasMethod,
    OwnsMethod,
    Calls,
    Returns,
}

impl RelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelType::BelongsTo => "BELONGS_TO",
            RelType::Contains => "CONTAINS",
            RelType::HasProperty => "HAS_PROPERTY",
            RelType::HasParameter => "HAS_PARAMETER",
            RelType::HasImport => "HAS_IMPORT",
            RelType::Imports => "IMPORTS",
            RelType::DependsOn => "DEPENDS_ON",
            RelType::HasMethod => "HAS_METHOD",
            RelType::OwnsMethod => "OWNS_METHOD",
            RelType::Calls => "CALLS",
            RelType::Returns => "RETURNS",
        }
    }
}

/// A node addressed by label and identity key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeRef {
    pub label: NodeLabel,
    pub key: String,
}

impl NodeRef {
    pub fn new(label: NodeLabel, key: impl Into<String>) -> Self {
        Self { label, key: key.into() }
    }

    fn pattern(&self, var: &str, param: &str) -> String {
        format!("({var}:{} {{{}: ${param}}})", self.label.as_str(), self.label.key_property())
    }
}

/// One parameterized statement run inside a transaction.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// Create the node if absent; `on_create` properties are only set on creation.
    MergeNode { node: NodeRef, on_create: Properties },
    /// MATCH both endpoints, then MERGE the relationship between them.
    /// A missing endpoint makes this a no-op.
    MergeEdge {
        from: NodeRef,
        rel: RelType,
        to: NodeRef,
        on_create: Properties,
    },
    /// Overwrite properties on an existing node.
    SetProperties { node: NodeRef, properties: Properties },
    /// File paths ending with or containing `fragment`.
    /// Returns `path` and `suffix_match` columns ordered by path.
    FindFiles { fragment: String },
    /// Functions with exactly this name anywhere in the graph.
    /// Returns `id` and `is_method_of` columns ordered by id.
    FindFunctions { name: String },
    /// Free-form Cypher.
    Cypher { text: String, params: Properties },
}

impl Statement {
    pub fn cypher(text: impl Into<String>) -> Self {
        Statement::Cypher { text: text.into(), params: Properties::new() }
    }

    pub fn merge_node(node: NodeRef, on_create: Properties) -> Self {
        Statement::MergeNode { node, on_create }
    }

    pub fn merge_edge(from: NodeRef, rel: RelType, to: NodeRef) -> Self {
        Statement::MergeEdge { from, rel, to, on_create: Properties::new() }
    }

    /// Attach on-create properties to a `MergeEdge`.
    pub fn with_edge_props(self, props: Properties) -> Self {
        match self {
            Statement::MergeEdge { from, rel, to, .. } => Statement::MergeEdge { from, rel, to, on_create: props },
            other => other,
        }
    }

    /// Render to Cypher text.
    pub fn text(&self) -> String {
        match self {
            Statement::MergeNode { node, .. } => {
                format!("MERGE {} ON CREATE SET n += $props", node.pattern("n", "key"))
            }
            Statement::MergeEdge { from, rel, to, .. } => format!(
                "MATCH {} MATCH {} MERGE (a)-[r:{}]->(b) ON CREATE SET r += $props",
                from.pattern("a", "from"),
                to.pattern("b", "to"),
                rel.as_str()
            ),
            Statement::SetProperties { node, .. } => {
                format!("MATCH {} SET n += $props", node.pattern("n", "key"))
            }
            Statement::FindFiles { .. } => "MATCH (f:File) \
                 WHERE f.path ENDS WITH $fragment OR f.path CONTAINS $fragment \
                 RETURN f.path AS path, f.path ENDS WITH $fragment AS suffix_match \
                 ORDER BY path"
                .to_string(),
            Statement::FindFunctions { .. } => "MATCH (fn:Function {name: $name}) \
                 RETURN fn.id AS id, fn.is_method_of AS is_method_of \
                 ORDER BY id"
                .to_string(),
            Statement::Cypher { text, .. } => text.clone(),
        }
    }

    /// Parameters bound to the rendered text.
    pub fn params(&self) -> Properties {
        let value = match self {
            Statement::MergeNode { node, on_create } => json!({ "key": node.key, "props": on_create }),
            Statement::MergeEdge { from, to, on_create, .. } => {
                json!({ "from": from.key, "to": to.key, "props": on_create })
            }
            Statement::SetProperties { node, properties } => json!({ "key": node.key, "props": properties }),
            Statement::FindFiles { fragment } => json!({ "fragment": fragment }),
            Statement::FindFunctions { name } => json!({ "name": name }),
            Statement::Cypher { params, .. } => return params.clone(),
        };
        match value {
            Value::Object(map) => map,
            _ => Properties::new(),
        }
    }

    /// Whether this statement can modify the graph.
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            Statement::MergeNode { .. } | Statement::MergeEdge { .. } | Statement::SetProperties { .. }
        )
    }
}

/// Build a [`Properties`] map from a JSON object literal.
pub(crate) fn props(value: Value) -> Properties {
    match value {
        Value::Object(map) => map,
        _ => Properties::new(),
    }
}
