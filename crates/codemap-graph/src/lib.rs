//! # Codemap Graph
//!
//! Neo4j property-graph integration for Codemap.
//!
//! Materializes analysis documents into a multi-tenant code graph, scopes
//! caller-supplied read queries to one project, and canonicalizes query
//! results into a node/edge shape for visualization.

mod bolt;
pub mod client;
pub mod import;
pub mod query;
pub mod queries;
pub mod schema;
pub mod statement;
pub mod store;
pub mod value;

#[cfg(test)]
pub(crate) mod memory;

pub use client::{GraphClient, GraphConfig, GraphCounts};
pub use import::{import_analysis, set_project_status, ImportDiagnostic, ImportReport, LinkKind};
pub use query::classify::{classify, GraphResult, QueryResult};
pub use query::scope::{scope, scope_query, ScopeOutcome, ScopedQuery};
pub use queries::{FileEntry, LabelCount, Overview, TopNode};
pub use query::{execute, execute_classified, QueryRequest};
pub use schema::initialize_schema;
pub use statement::{NodeLabel, NodeRef, Properties, RelType, Statement};
pub use store::{AccessMode, GraphStore, GraphTransaction};
pub use value::{GraphValue, NodeValue, Record, RelationshipValue};
