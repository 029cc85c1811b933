//! Application configuration.
//!
//! Values come from an optional TOML file, then connection flags (which
//! clap also fills from `NEO4J_*` environment variables) override them.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use codemap_graph::GraphConfig;

/// Per-operation deadlines, in seconds.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct QuerySettings {
    pub query_timeout_secs: u64,
    pub overview_timeout_secs: u64,
    pub import_timeout_secs: u64,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            query_timeout_secs: 30,
            overview_timeout_secs: 15,
            import_timeout_secs: 15 * 60,
        }
    }
}

impl QuerySettings {
    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }

    pub fn overview_timeout(&self) -> Duration {
        Duration::from_secs(self.overview_timeout_secs)
    }

    pub fn import_timeout(&self) -> Duration {
        Duration::from_secs(self.import_timeout_secs)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    #[serde(alias = "neo4j")]
    pub graph: GraphConfig,
    pub query: QuerySettings,
}

/// Connection settings given on the command line or through the environment.
#[derive(Debug, Clone, Default)]
pub struct ConnectionOverrides {
    pub uri: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
}

impl AppConfig {
    /// Load from `path`, or defaults when no file is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn apply(mut self, overrides: ConnectionOverrides) -> Self {
        if let Some(uri) = overrides.uri {
            self.graph.uri = uri;
        }
        if let Some(user) = overrides.user {
            self.graph.user = user;
        }
        if let Some(password) = overrides.password {
            self.graph.password = password;
        }
        if let Some(database) = overrides.database {
            self.graph.db = database;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::load(None).unwrap();
        assert_eq!(config.graph.uri, "bolt://localhost:7687");
        assert_eq!(config.query.query_timeout(), Duration::from_secs(30));
        assert_eq!(config.query.import_timeout(), Duration::from_secs(900));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = AppConfig::parse(
            r#"
            [graph]
            uri = "bolt://graph.internal:7687"
            password = "s3cret"

            [query]
            query_timeout_secs = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.graph.uri, "bolt://graph.internal:7687");
        assert_eq!(config.graph.user, "neo4j");
        assert_eq!(config.graph.password, "s3cret");
        assert_eq!(config.query.query_timeout_secs, 5);
        assert_eq!(config.query.overview_timeout_secs, 15);
    }

    #[test]
    fn test_neo4j_table_alias() {
        let config = AppConfig::parse("[neo4j]\ndb = \"codegraph\"\n").unwrap();
        assert_eq!(config.graph.db, "codegraph");
    }

    #[test]
    fn test_overrides_win() {
        let config = AppConfig::parse("[graph]\nuser = \"reader\"\n").unwrap().apply(ConnectionOverrides {
            uri: Some("bolt://other:7687".to_string()),
            database: Some("analysis".to_string()),
            ..Default::default()
        });

        assert_eq!(config.graph.uri, "bolt://other:7687");
        assert_eq!(config.graph.user, "reader");
        assert_eq!(config.graph.db, "analysis");
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        assert!(AppConfig::parse("[query]\nquery_timeout_secs = \"soon\"\n").is_err());
    }
}
