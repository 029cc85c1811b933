//! Centralized error types for Codemap.

use std::time::Duration;

use thiserror::Error;

/// Main error type for Codemap operations.
#[derive(Error, Debug)]
pub enum CodemapError {
    #[error("Malformed analysis: {0}")]
    IngestMalformed(String),

    #[error("Graph write failed: {0}")]
    WriteFailure(String),

    #[error("Query timed out after {}s", .0.as_secs_f64())]
    QueryTimeout(Duration),

    #[error("Query execution failed: {0}")]
    QueryExecutionFailure(String),

    #[error("Graph store error: {0}")]
    Store(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for Codemap operations.
pub type CodemapResult<T> = Result<T, CodemapError>;

impl CodemapError {
    /// Create a malformed-ingest error.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::IngestMalformed(msg.into())
    }

    /// Create a store error from any driver error.
    pub fn store(err: impl std::fmt::Display) -> Self {
        Self::Store(err.to_string())
    }

    /// Reclassify a store error raised inside a write transaction.
    pub fn into_write_failure(self) -> Self {
        match self {
            Self::Store(msg) => Self::WriteFailure(msg),
            other => other,
        }
    }

    /// Reclassify a store error raised inside a read transaction.
    pub fn into_query_failure(self) -> Self {
        match self {
            Self::Store(msg) => Self::QueryExecutionFailure(msg),
            other => other,
        }
    }
}
