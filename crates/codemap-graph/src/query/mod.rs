//! Query execution gateway.
//!
//! Scopes a caller's read query to a tenant, runs it in its own read
//! transaction under a deadline, and hands back either the raw rows or the
//! classified result. There is no partial success: a timeout or any store
//! error fails the whole call.

pub mod classify;
pub mod scope;

use std::time::{Duration, Instant};

use serde_json::{json, Value};
use tracing::{debug, info, warn};

use codemap_core::{CodemapError, CodemapResult};

use crate::statement::{Properties, Statement};
use crate::store::{AccessMode, GraphStore};
use crate::value::Record;
use classify::QueryResult;
use scope::{ScopeOutcome, PROJECT_PARAM};

/// Deadline applied when the caller does not set one.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(30);

/// One read request.
#[derive(Debug, Clone)]
pub struct QueryRequest {
    pub tenant_id: Option<String>,
    pub text: String,
    pub params: Properties,
    pub timeout: Duration,
}

impl QueryRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            tenant_id: None,
            text: text.into(),
            params: Properties::new(),
            timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }

    /// Scope the query to a project. An empty id means no tenant.
    pub fn for_tenant(mut self, tenant_id: impl Into<String>) -> Self {
        let tenant_id = tenant_id.into();
        self.tenant_id = (!tenant_id.is_empty()).then_some(tenant_id);
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn with_params(mut self, params: Properties) -> Self {
        self.params.extend(params);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The statement actually sent to the store, with tenant scoping applied.
    pub fn prepare(&self) -> (Statement, ScopeOutcome) {
        let mut params = self.params.clone();
        let (text, outcome) = match self.tenant_id.as_deref() {
            Some(tenant) => {
                params.insert(PROJECT_PARAM.to_string(), json!(tenant));
                let scoped = scope::scope_query(&self.text);
                (scoped.text, scoped.outcome)
            }
            None => (self.text.clone(), ScopeOutcome::NotApplied),
        };
        (Statement::Cypher { text, params }, outcome)
    }
}

/// Run a read query and return its raw rows.
pub async fn execute(store: &dyn GraphStore, request: &QueryRequest) -> CodemapResult<Vec<Record>> {
    let (statement, outcome) = request.prepare();
    if let Some(tenant) = request.tenant_id.as_deref() {
        if outcome.is_applied() {
            debug!(tenant, ?outcome, "Query scoped to project");
        } else {
            warn!(tenant, "No anchor pattern found; query runs unscoped");
        }
    }

    let started = Instant::now();
    let rows = tokio::time::timeout(request.timeout, run_read(store, &statement))
        .await
        .map_err(|_| {
            warn!(timeout_secs = request.timeout.as_secs_f64(), "Query timed out");
            CodemapError::QueryTimeout(request.timeout)
        })??;

    info!(rows = rows.len(), elapsed_ms = started.elapsed().as_millis() as u64, "Query executed");
    Ok(rows)
}

/// Run a read query and classify the rows.
pub async fn execute_classified(store: &dyn GraphStore, request: &QueryRequest) -> CodemapResult<QueryResult> {
    let rows = execute(store, request).await?;
    Ok(classify::classify(rows))
}

/// One read transaction. A timed-out future is dropped, which discards the
/// transaction with it.
async fn run_read(store: &dyn GraphStore, statement: &Statement) -> CodemapResult<Vec<Record>> {
    let mut tx = store
        .begin(AccessMode::Read)
        .await
        .map_err(CodemapError::into_query_failure)?;

    match tx.run(statement).await {
        Ok(rows) => {
            tx.commit().await.map_err(CodemapError::into_query_failure)?;
            Ok(rows)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                warn!(error = %rollback_err, "Rollback failed");
            }
            Err(err.into_query_failure())
        }
    }
}
