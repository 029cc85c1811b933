//! Codemap Core Library
//!
//! The analysis document produced by the external static analyzer, the
//! deterministic keys that give every graph node its identity, and the
//! error taxonomy shared by the graph and CLI crates.

pub mod analysis;
pub mod error;
pub mod project;

pub use analysis::model::{Analysis, ClassDef, FunctionDef, ImportDef, SourceFile};
pub use error::{CodemapError, CodemapResult};
pub use project::model::ProjectStatus;
