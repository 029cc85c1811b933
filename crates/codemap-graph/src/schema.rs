//! Neo4j schema initialization (constraints and indexes).

use tracing::{info, warn};

use codemap_core::{CodemapError, CodemapResult};

use crate::statement::{NodeLabel, Statement};
use crate::store::{AccessMode, GraphStore};

/// One uniqueness constraint per node label on its key property, plus a
/// lookup index for call resolution by function name.
pub fn schema_statements() -> Vec<String> {
    let mut statements: Vec<String> = NodeLabel::ALL
        .iter()
        .map(|label| {
            let name = format!("{}_{}", label.as_str().to_lowercase(), label.key_property());
            format!(
                "CREATE CONSTRAINT {name} IF NOT EXISTS FOR (x:{}) REQUIRE x.{} IS UNIQUE",
                label.as_str(),
                label.key_property()
            )
        })
        .collect();
    statements.push("CREATE INDEX function_name IF NOT EXISTS FOR (f:Function) ON (f.name)".to_string());
    statements
}

/// Initialize Neo4j schema with constraints and indexes.
///
/// Safe to run multiple times - uses IF NOT EXISTS clauses. Schema changes
/// cannot share a transaction with other writes, so each runs on its own.
pub async fn initialize_schema(store: &dyn GraphStore) -> CodemapResult<usize> {
    info!("Initializing Neo4j schema...");

    let statements = schema_statements();
    for text in &statements {
        let mut tx = store
            .begin(AccessMode::Write)
            .await
            .map_err(CodemapError::into_write_failure)?;
        if let Err(err) = tx.run(&Statement::cypher(text.as_str())).await {
            if let Err(rollback_err) = tx.rollback().await {
                warn!(statement = %text, error = %rollback_err, "Rollback failed");
            }
            return Err(CodemapError::WriteFailure(format!("schema statement failed: {text}: {err}")));
        }
        tx.commit().await.map_err(CodemapError::into_write_failure)?;
    }

    info!("Neo4j schema initialized ({} statements)", statements.len());
    Ok(statements.len())
}
