//! Neo4j connection client.

use anyhow::{Context, Result};
use async_trait::async_trait;
use neo4rs::{ConfigBuilder, Graph, Query, Txn};
use serde::{Deserialize, Serialize};
use tracing::debug;

use codemap_core::{CodemapError, CodemapResult};

use crate::bolt;
use crate::statement::Statement;
use crate::store::{AccessMode, GraphStore, GraphTransaction};
use crate::value::Record;

/// Configuration for connecting to Neo4j.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
    pub db: String,
    pub max_connections: usize,
    pub fetch_size: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            uri: "bolt://localhost:7687".to_string(),
            user: "neo4j".to_string(),
            password: "password".to_string(),
            db: "neo4j".to_string(),
            max_connections: 8,
            fetch_size: 500,
        }
    }
}

/// Client for Neo4j code-graph operations.
#[derive(Clone)]
pub struct GraphClient {
    graph: Graph,
}

impl GraphClient {
    /// Create a new GraphClient from config.
    ///
    /// `Graph::connect` only builds a lazy pool, so a `RETURN 1` ping forces
    /// the bolt handshake and surfaces an unreachable server immediately.
    pub async fn connect(config: &GraphConfig) -> Result<Self> {
        let neo4j_config = ConfigBuilder::default()
            .uri(&config.uri)
            .user(&config.user)
            .password(&config.password)
            .db(config.db.as_str())
            .max_connections(config.max_connections)
            .fetch_size(config.fetch_size)
            .build()
            .context("Failed to build Neo4j config")?;

        let graph = Graph::connect(neo4j_config)
            .await
            .context("Failed to create Neo4j connection pool")?;

        graph
            .run(Query::new("RETURN 1".to_string()))
            .await
            .context("Neo4j is not responding to queries")?;

        debug!(uri = %config.uri, db = %config.db, "Connected to Neo4j");
        Ok(Self { graph })
    }
}

#[async_trait]
impl GraphStore for GraphClient {
    async fn begin(&self, mode: AccessMode) -> CodemapResult<Box<dyn GraphTransaction>> {
        let txn = self.graph.start_txn().await.map_err(CodemapError::store)?;
        debug!(?mode, "Opened Neo4j transaction");
        Ok(Box::new(Neo4jTransaction { txn, mode }))
    }
}

/// A neo4rs transaction behind the [`GraphTransaction`] seam.
struct Neo4jTransaction {
    txn: Txn,
    mode: AccessMode,
}

#[async_trait]
impl GraphTransaction for Neo4jTransaction {
    async fn run(&mut self, statement: &Statement) -> CodemapResult<Vec<Record>> {
        if self.mode == AccessMode::Read && statement.is_write() {
            return Err(CodemapError::Store(format!(
                "write statement in read transaction: {}",
                statement.text()
            )));
        }

        let mut stream = self
            .txn
            .execute(bolt::to_query(statement))
            .await
            .map_err(CodemapError::store)?;

        let mut records = Vec::new();
        while let Some(row) = stream.next(self.txn.handle()).await.map_err(CodemapError::store)? {
            records.push(bolt::row_to_record(&row));
        }
        Ok(records)
    }

    async fn commit(self: Box<Self>) -> CodemapResult<()> {
        // Read transactions are never committed so free-form text cannot persist writes.
        match self.mode {
            AccessMode::Write => self.txn.commit().await.map_err(CodemapError::store),
            AccessMode::Read => self.txn.rollback().await.map_err(CodemapError::store),
        }
    }

    async fn rollback(self: Box<Self>) -> CodemapResult<()> {
        self.txn.rollback().await.map_err(CodemapError::store)
    }
}

/// Node and relationship counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphCounts {
    pub nodes: usize,
    pub relationships: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults_fill_missing_fields() {
        let config: GraphConfig = serde_json::from_str(r#"{"uri": "bolt://db:7687", "db": "code"}"#).unwrap();
        assert_eq!(config.uri, "bolt://db:7687");
        assert_eq!(config.db, "code");
        assert_eq!(config.user, "neo4j");
        assert_eq!(config.max_connections, 8);
    }
}
