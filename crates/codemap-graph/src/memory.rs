//! In-memory [`GraphStore`] for tests.
//!
//! Each transaction works on a private copy of the graph taken at `begin`
//! and publishes it on commit, so a rolled-back or dropped transaction
//! leaves no trace. Edge MERGEs require both endpoints to exist, matching
//! `MATCH ... MERGE` in Cypher.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use codemap_core::{CodemapError, CodemapResult};

use crate::statement::{NodeLabel, NodeRef, Properties, RelType, Statement};
use crate::store::{AccessMode, GraphStore, GraphTransaction};
use crate::value::{GraphValue, Record};

type EdgeKey = (NodeRef, RelType, NodeRef);
type FailurePredicate = Arc<dyn Fn(&Statement) -> bool + Send + Sync>;

#[derive(Debug, Clone, Default)]
pub(crate) struct MemoryGraph {
    pub nodes: BTreeMap<NodeRef, Properties>,
    pub edges: BTreeMap<EdgeKey, Properties>,
}

impl MemoryGraph {
    pub fn count_nodes(&self, label: NodeLabel) -> usize {
        self.nodes.keys().filter(|n| n.label == label).count()
    }

    pub fn count_edges(&self, rel: RelType) -> usize {
        self.edges.keys().filter(|(_, r, _)| *r == rel).count()
    }

    pub fn node(&self, label: NodeLabel, key: &str) -> Option<&Properties> {
        self.nodes.get(&NodeRef::new(label, key))
    }

    /// Targets of `rel` edges leaving `from`.
    pub fn targets(&self, from: &NodeRef, rel: RelType) -> Vec<&NodeRef> {
        self.edges
            .keys()
            .filter(|(f, r, _)| f == from && *r == rel)
            .map(|(_, _, to)| to)
            .collect()
    }

    pub fn edge(&self, from: &NodeRef, rel: RelType, to: &NodeRef) -> Option<&Properties> {
        self.edges.get(&(from.clone(), rel, to.clone()))
    }

    fn apply(&mut self, statement: &Statement) -> Vec<Record> {
        match statement {
            Statement::MergeNode { node, on_create } => {
                self.nodes.entry(node.clone()).or_insert_with(|| on_create.clone());
                Vec::new()
            }
            Statement::MergeEdge { from, rel, to, on_create } => {
                if self.nodes.contains_key(from) && self.nodes.contains_key(to) {
                    self.edges
                        .entry((from.clone(), *rel, to.clone()))
                        .or_insert_with(|| on_create.clone());
                }
                Vec::new()
            }
            Statement::SetProperties { node, properties } => {
                if let Some(existing) = self.nodes.get_mut(node) {
                    existing.extend(properties.clone());
                }
                Vec::new()
            }
            Statement::FindFiles { fragment } => self
                .nodes
                .keys()
                .filter(|n| n.label == NodeLabel::File && n.key.contains(fragment.as_str()))
                .map(|n| {
                    Record::from([
                        ("path".to_string(), GraphValue::from(n.key.as_str())),
                        ("suffix_match".to_string(), GraphValue::from(Value::Bool(n.key.ends_with(fragment.as_str())))),
                    ])
                })
                .collect(),
            Statement::FindFunctions { name } => self
                .nodes
                .iter()
                .filter(|(n, props)| n.label == NodeLabel::Function && props.get("name") == Some(&Value::from(name.as_str())))
                .map(|(n, props)| {
                    Record::from([
                        ("id".to_string(), GraphValue::from(n.key.as_str())),
                        (
                            "is_method_of".to_string(),
                            GraphValue::from(props.get("is_method_of").cloned().unwrap_or(Value::Null)),
                        ),
                    ])
                })
                .collect(),
            Statement::Cypher { .. } => Vec::new(),
        }
    }
}

#[derive(Default)]
struct Counters {
    commits: AtomicUsize,
    rollbacks: AtomicUsize,
}

#[derive(Clone, Default)]
pub(crate) struct MemoryStore {
    graph: Arc<Mutex<MemoryGraph>>,
    log: Arc<Mutex<Vec<(AccessMode, Statement)>>>,
    counters: Arc<Counters>,
    rows: Vec<Record>,
    fail_when: Option<FailurePredicate>,
    delay: Option<Duration>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows returned for every free-form Cypher statement.
    pub fn with_rows(mut self, rows: Vec<Record>) -> Self {
        self.rows = rows;
        self
    }

    /// Fail any statement matching the predicate.
    pub fn failing_on(mut self, predicate: impl Fn(&Statement) -> bool + Send + Sync + 'static) -> Self {
        self.fail_when = Some(Arc::new(predicate));
        self
    }

    /// Sleep before running each statement.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Committed state.
    pub fn snapshot(&self) -> MemoryGraph {
        self.graph.lock().unwrap().clone()
    }

    pub fn statements(&self) -> Vec<(AccessMode, Statement)> {
        self.log.lock().unwrap().clone()
    }

    pub fn commits(&self) -> usize {
        self.counters.commits.load(Ordering::SeqCst)
    }

    pub fn rollbacks(&self) -> usize {
        self.counters.rollbacks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GraphStore for MemoryStore {
    async fn begin(&self, mode: AccessMode) -> CodemapResult<Box<dyn GraphTransaction>> {
        Ok(Box::new(MemoryTransaction {
            working: self.snapshot(),
            store: self.clone(),
            mode,
        }))
    }
}

struct MemoryTransaction {
    store: MemoryStore,
    working: MemoryGraph,
    mode: AccessMode,
}

#[async_trait]
impl GraphTransaction for MemoryTransaction {
    async fn run(&mut self, statement: &Statement) -> CodemapResult<Vec<Record>> {
        if let Some(delay) = self.store.delay {
            tokio::time::sleep(delay).await;
        }
        self.store.log.lock().unwrap().push((self.mode, statement.clone()));

        if self.store.fail_when.as_ref().is_some_and(|fail| fail(statement)) {
            return Err(CodemapError::Store(format!("injected failure: {}", statement.text())));
        }
        if self.mode == AccessMode::Read && statement.is_write() {
            return Err(CodemapError::Store("write statement in read transaction".to_string()));
        }
        if let Statement::Cypher { .. } = statement {
            return Ok(self.store.rows.clone());
        }
        Ok(self.working.apply(statement))
    }

    async fn commit(self: Box<Self>) -> CodemapResult<()> {
        let this = *self;
        if this.mode == AccessMode::Write {
            *this.store.graph.lock().unwrap() = this.working;
        }
        this.store.counters.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> CodemapResult<()> {
        self.store.counters.rollbacks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
