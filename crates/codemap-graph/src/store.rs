//! Transactional graph-store abstraction.
//!
//! The writer and the query gateway only ever talk to a [`GraphStore`];
//! [`crate::GraphClient`] is the Neo4j implementation.

use async_trait::async_trait;

use codemap_core::CodemapResult;

use crate::statement::Statement;
use crate::value::Record;

/// Declared access mode of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    Read,
    Write,
}

/// A store that can open transactions.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Open a transaction. Nothing it runs is visible to others until commit.
    async fn begin(&self, mode: AccessMode) -> CodemapResult<Box<dyn GraphTransaction>>;
}

/// An open transaction. Dropping it without commit discards its writes.
#[async_trait]
pub trait GraphTransaction: Send {
    /// Run one statement and collect every result row.
    async fn run(&mut self, statement: &Statement) -> CodemapResult<Vec<Record>>;

    async fn commit(self: Box<Self>) -> CodemapResult<()>;

    async fn rollback(self: Box<Self>) -> CodemapResult<()>;
}
