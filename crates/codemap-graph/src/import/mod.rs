//! Analysis import into the code graph.
//!
//! One analysis is written in exactly one write transaction, in two passes:
//! all nodes first (fatal on failure), then all relationships between them
//! (best-effort). Every node is MERGEd on a deterministic key, so importing
//! an unchanged analysis again leaves node and edge counts unchanged.

mod links;
mod nodes;
mod resolve;

use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use codemap_core::{Analysis, CodemapError, CodemapResult, ProjectStatus};

use crate::statement::{props, NodeLabel, NodeRef, Statement};
use crate::store::{AccessMode, GraphStore, GraphTransaction};
use resolve::Resolution;

/// Relationship families created in the relationship pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkKind {
    Import,
    ClassMethod,
    MethodOwner,
    Call,
    ReturnType,
}

/// Something worth knowing about an import that did not fail it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ImportDiagnostic {
    /// The analyzer reported an error for this file; its structure was still imported.
    AnalyzerError { path: String, message: String },
    /// No target exists for a reference.
    Unresolved { link: LinkKind, from: String, target: String },
    /// Several equally ranked targets existed; `chosen` was linked.
    Ambiguous {
        link: LinkKind,
        from: String,
        target: String,
        chosen: String,
        candidates: Vec<String>,
    },
    /// A relationship statement failed and was skipped.
    LinkFailed {
        link: LinkKind,
        from: String,
        target: String,
        error: String,
    },
}

/// Result of an import operation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    pub files: usize,
    pub nodes_merged: usize,
    pub relationships_merged: usize,
    pub calls_resolved: usize,
    pub internal_imports: usize,
    pub external_dependencies: usize,
    pub diagnostics: Vec<ImportDiagnostic>,
}

impl ImportReport {
    fn unresolved(&mut self, link: LinkKind, from: &str, target: &str) {
        warn!(?link, from, target, "Relationship target not found");
        self.diagnostics.push(ImportDiagnostic::Unresolved {
            link,
            from: from.to_string(),
            target: target.to_string(),
        });
    }

    fn note_ambiguity(&mut self, link: LinkKind, from: &str, target: &str, resolution: &Resolution) {
        if let Resolution::Ambiguous { chosen, candidates } = resolution {
            warn!(?link, from, target, chosen = %chosen, candidates = candidates.len(), "Ambiguous relationship target");
            self.diagnostics.push(ImportDiagnostic::Ambiguous {
                link,
                from: from.to_string(),
                target: target.to_string(),
                chosen: chosen.clone(),
                candidates: candidates.clone(),
            });
        }
    }

    /// Diagnostics other than analyzer-reported file errors.
    pub fn link_issues(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| !matches!(d, ImportDiagnostic::AnalyzerError { .. }))
            .count()
    }
}

/// Run one statement and count what it merged.
async fn run_counted(
    tx: &mut dyn GraphTransaction,
    stmt: &Statement,
    report: &mut ImportReport,
) -> CodemapResult<()> {
    tx.run(stmt).await?;
    match stmt {
        Statement::MergeNode { .. } => report.nodes_merged += 1,
        Statement::MergeEdge { .. } => report.relationships_merged += 1,
        _ => {}
    }
    Ok(())
}

/// Import an analysis under a project, atomically.
///
/// Fails with `IngestMalformed` before anything is written if the project id
/// is empty or the analysis lacks identity fields, and with `WriteFailure`
/// (nothing committed) if any node statement or the commit fails.
pub async fn import_analysis(
    store: &dyn GraphStore,
    analysis: &Analysis,
    project_id: &str,
    project_name: &str,
) -> CodemapResult<ImportReport> {
    if project_id.trim().is_empty() {
        return Err(CodemapError::malformed("project id is empty"));
    }
    analysis.validate()?;

    let stats = analysis.stats();
    info!(
        project_id,
        files = stats.files,
        classes = stats.classes,
        functions = stats.functions,
        imports = stats.imports,
        files_with_errors = stats.files_with_errors,
        "Importing analysis"
    );

    let mut report = ImportReport { files: stats.files, ..Default::default() };
    for file in &analysis.files {
        if let Some(message) = file.analyzer_error() {
            warn!(path = %file.path, error = message, "Analyzer reported an error; importing file structure anyway");
            report.diagnostics.push(ImportDiagnostic::AnalyzerError {
                path: file.path.clone(),
                message: message.to_string(),
            });
        }
    }

    let mut tx = store
        .begin(AccessMode::Write)
        .await
        .map_err(CodemapError::into_write_failure)?;
    let project = NodeRef::new(NodeLabel::Project, project_id);

    if let Err(err) = write_analysis(tx.as_mut(), analysis, &project, project_name, &mut report).await {
        warn!(project_id, error = %err, "Import failed; rolling back");
        if let Err(rollback_err) = tx.rollback().await {
            warn!(project_id, error = %rollback_err, "Rollback failed");
        }
        return Err(err.into_write_failure());
    }

    tx.commit().await.map_err(CodemapError::into_write_failure)?;

    info!(
        project_id,
        nodes = report.nodes_merged,
        rels = report.relationships_merged,
        calls = report.calls_resolved,
        internal_imports = report.internal_imports,
        external_dependencies = report.external_dependencies,
        issues = report.link_issues(),
        "Import complete"
    );
    Ok(report)
}

async fn write_analysis(
    tx: &mut dyn GraphTransaction,
    analysis: &Analysis,
    project: &NodeRef,
    project_name: &str,
    report: &mut ImportReport,
) -> CodemapResult<()> {
    nodes::merge_project(tx, project, project_name, report).await?;

    for file in &analysis.files {
        nodes::merge_file(tx, file, project, report)
            .await
            .map_err(|err| CodemapError::WriteFailure(format!("failed to create nodes for file {}: {}", file.path, err)))?;
    }
    info!(nodes = report.nodes_merged, rels = report.relationships_merged, "Node pass complete");

    let ctx = links::LinkContext::new(analysis);
    for file in &analysis.files {
        links::link_file(tx, &ctx, file, report).await;
    }
    info!(rels = report.relationships_merged, issues = report.link_issues(), "Relationship pass complete");

    Ok(())
}

/// Update the Project node's status, the one field changed after import.
pub async fn set_project_status(
    store: &dyn GraphStore,
    project_id: &str,
    status: ProjectStatus,
) -> CodemapResult<()> {
    let stmt = Statement::SetProperties {
        node: NodeRef::new(NodeLabel::Project, project_id),
        properties: props(json!({
            "status": status.as_str(),
            "updated_at": chrono::Utc::now().to_rfc3339(),
        })),
    };

    let mut tx = store
        .begin(AccessMode::Write)
        .await
        .map_err(CodemapError::into_write_failure)?;
    if let Err(err) = tx.run(&stmt).await {
        if let Err(rollback_err) = tx.rollback().await {
            warn!(project_id, error = %rollback_err, "Rollback failed");
        }
        return Err(err.into_write_failure());
    }
    tx.commit().await.map_err(CodemapError::into_write_failure)?;

    info!(project_id, status = %status, "Project status updated");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryGraph, MemoryStore};
    use crate::statement::RelType;
    use codemap_core::{ClassDef, FunctionDef, ImportDef, SourceFile};

    fn func(name: &str, calls: &[&str]) -> FunctionDef {
        FunctionDef {
            name: name.to_string(),
            calls: calls.iter().map(|c| c.to_string()).collect(),
            ..Default::default()
        }
    }

    fn file(path: &str, functions: Vec<FunctionDef>) -> SourceFile {
        SourceFile {
            path: path.to_string(),
            language: "javascript".to_string(),
            functions,
            ..Default::default()
        }
    }

    fn with_imports(mut file: SourceFile, sources: &[&str]) -> SourceFile {
        file.imports = sources.iter().map(|s| ImportDef::new(*s)).collect();
        file
    }

    fn function(key: &str) -> NodeRef {
        NodeRef::new(NodeLabel::Function, key)
    }

    fn file_ref(path: &str) -> NodeRef {
        NodeRef::new(NodeLabel::File, path)
    }

    fn sample_analysis() -> Analysis {
        let mut service = file(
            "src/service.ts",
            vec![
                FunctionDef {
                    name: "save".to_string(),
                    is_method_of: Some("UserService".to_string()),
                    params: vec!["user".to_string(), "opts".to_string()],
                    return_types: vec!["Promise<User>".to_string(), "void".to_string()],
                    calls: vec!["validate".to_string(), "log".to_string()],
                    ..Default::default()
                },
                func("validate", &[]),
            ],
        );
        service.classes = vec![ClassDef {
            name: "UserService".to_string(),
            is_exported: true,
            properties: vec!["repo".to_string()],
            methods: vec!["save".to_string()],
        }];
        let service = with_imports(service, &["util", "express"]);
        let util = with_imports(file("src/util.ts", vec![func("log", &[])]), &["express"]);
        Analysis { files: vec![service, util] }
    }

    fn belongs_to_count(graph: &MemoryGraph, node: &NodeRef) -> usize {
        graph.targets(node, RelType::BelongsTo).len()
    }

    #[tokio::test]
    async fn test_end_to_end_single_function() {
        let store = MemoryStore::new();
        let analysis = Analysis { files: vec![file("a.js", vec![func("foo", &[])])] };

        import_analysis(&store, &analysis, "P1", "demo").await.unwrap();

        let graph = store.snapshot();
        assert_eq!(graph.count_nodes(NodeLabel::File), 1);
        assert_eq!(graph.count_nodes(NodeLabel::Function), 1);
        assert!(graph.node(NodeLabel::Function, "a.js#foo").is_some());
        assert_eq!(graph.count_edges(RelType::BelongsTo), 2);
        assert_eq!(graph.count_edges(RelType::Calls), 0);
        assert_eq!(graph.count_edges(RelType::Imports), 0);

        let project = NodeRef::new(NodeLabel::Project, "P1");
        assert_eq!(graph.targets(&file_ref("a.js"), RelType::BelongsTo), vec![&project]);
        assert_eq!(graph.targets(&function("a.js#foo"), RelType::BelongsTo), vec![&project]);
        assert_eq!(store.commits(), 1);
    }

    #[tokio::test]
    async fn test_reimport_is_idempotent() {
        let store = MemoryStore::new();
        let analysis = sample_analysis();

        import_analysis(&store, &analysis, "P1", "demo").await.unwrap();
        let first = store.snapshot();
        import_analysis(&store, &analysis, "P1", "demo").await.unwrap();
        let second = store.snapshot();

        assert_eq!(first.nodes.len(), second.nodes.len());
        assert_eq!(first.edges.len(), second.edges.len());
        assert_eq!(
            first.nodes.keys().collect::<Vec<_>>(),
            second.nodes.keys().collect::<Vec<_>>()
        );
    }

    #[tokio::test]
    async fn test_every_owned_node_belongs_to_one_project() {
        let store = MemoryStore::new();
        import_analysis(&store, &sample_analysis(), "P1", "demo").await.unwrap();

        let graph = store.snapshot();
        let owned: Vec<&NodeRef> = graph
            .nodes
            .keys()
            .filter(|n| matches!(n.label, NodeLabel::File | NodeLabel::Class | NodeLabel::Function))
            .collect();
        assert_eq!(owned.len(), 2 + 1 + 3);
        for node in owned {
            assert_eq!(belongs_to_count(&graph, node), 1, "{node:?}");
        }
        assert_eq!(belongs_to_count(&graph, &NodeRef::new(NodeLabel::Parameter, "src/service.ts#save(user)")), 0);
    }

    #[tokio::test]
    async fn test_structural_nodes_and_links() {
        let store = MemoryStore::new();
        let report = import_analysis(&store, &sample_analysis(), "P1", "demo").await.unwrap();
        let graph = store.snapshot();

        let class = NodeRef::new(NodeLabel::Class, "src/service.ts#UserService");
        let save = function("src/service.ts#save");
        assert!(graph.node(NodeLabel::Property, "src/service.ts#UserService::repo").is_some());
        assert_eq!(graph.targets(&save, RelType::HasParameter).len(), 2);
        assert_eq!(
            graph.node(NodeLabel::Parameter, "src/service.ts#save(opts)").unwrap()["position"],
            2
        );
        assert!(graph.edge(&class, RelType::HasMethod, &save).is_some());
        assert!(graph.edge(&class, RelType::OwnsMethod, &save).is_some());
        assert_eq!(graph.node(NodeLabel::Function, "src/service.ts#save").unwrap()["is_method"], true);

        let returns = graph.targets(&save, RelType::Returns);
        assert_eq!(returns, vec![&NodeRef::new(NodeLabel::ReturnType, "Promise<User>")]);
        assert_eq!(graph.count_nodes(NodeLabel::ReturnType), 1);

        assert_eq!(report.calls_resolved, 2);
        assert_eq!(report.link_issues(), 0);
    }

    #[tokio::test]
    async fn test_same_file_call_wins() {
        let store = MemoryStore::new();
        let analysis = Analysis {
            files: vec![
                file("b.js", vec![func("foo", &[])]),
                file("a.js", vec![func("foo", &[]), func("bar", &["foo"])]),
            ],
        };

        let report = import_analysis(&store, &analysis, "P1", "demo").await.unwrap();

        let graph = store.snapshot();
        assert_eq!(graph.targets(&function("a.js#bar"), RelType::Calls), vec![&function("a.js#foo")]);
        assert!(report.diagnostics.is_empty());
    }

    #[tokio::test]
    async fn test_call_resolves_to_file_later_in_document() {
        let store = MemoryStore::new();
        let analysis = Analysis {
            files: vec![
                file("a.js", vec![func("main", &["helper"])]),
                file("z.js", vec![func("helper", &[])]),
            ],
        };

        import_analysis(&store, &analysis, "P1", "demo").await.unwrap();

        let graph = store.snapshot();
        let edge = graph
            .edge(&function("a.js#main"), RelType::Calls, &function("z.js#helper"))
            .unwrap();
        assert_eq!(edge["call_order"], 1);
        assert_eq!(edge["call_type"], "function");
    }

    #[tokio::test]
    async fn test_ambiguous_global_call_is_reported() {
        let store = MemoryStore::new();
        let analysis = Analysis {
            files: vec![
                file("c.js", vec![func("foo", &[])]),
                file("b.js", vec![func("foo", &[])]),
                file("a.js", vec![func("bar", &["foo", "missing"])]),
            ],
        };

        let report = import_analysis(&store, &analysis, "P1", "demo").await.unwrap();

        let graph = store.snapshot();
        assert_eq!(graph.targets(&function("a.js#bar"), RelType::Calls), vec![&function("b.js#foo")]);
        assert!(report.diagnostics.contains(&ImportDiagnostic::Ambiguous {
            link: LinkKind::Call,
            from: "a.js#bar".to_string(),
            target: "foo".to_string(),
            chosen: "b.js#foo".to_string(),
            candidates: vec!["b.js#foo".to_string(), "c.js#foo".to_string()],
        }));
        assert!(report.diagnostics.contains(&ImportDiagnostic::Unresolved {
            link: LinkKind::Call,
            from: "a.js#bar".to_string(),
            target: "missing".to_string(),
        }));
    }

    #[tokio::test]
    async fn test_calls_prefer_current_project_over_others() {
        let store = MemoryStore::new();
        let other = Analysis { files: vec![file("lib/aaa.js", vec![func("shared", &[])])] };
        import_analysis(&store, &other, "P0", "other").await.unwrap();

        let analysis = Analysis {
            files: vec![
                file("src/main.js", vec![func("run", &["shared"])]),
                file("src/shared.js", vec![func("shared", &[])]),
            ],
        };
        let report = import_analysis(&store, &analysis, "P1", "demo").await.unwrap();

        let graph = store.snapshot();
        assert_eq!(
            graph.targets(&function("src/main.js#run"), RelType::Calls),
            vec![&function("src/shared.js#shared")]
        );
        assert!(report.diagnostics.is_empty());
    }

    #[tokio::test]
    async fn test_external_dependency_is_shared() {
        let store = MemoryStore::new();
        let report = import_analysis(&store, &sample_analysis(), "P1", "demo").await.unwrap();

        let graph = store.snapshot();
        let express = NodeRef::new(NodeLabel::ExternalDependency, "express");
        assert_eq!(graph.count_nodes(NodeLabel::ExternalDependency), 1);
        assert_eq!(graph.node(NodeLabel::ExternalDependency, "express").unwrap()["type"], "library");
        assert!(graph.edge(&file_ref("src/service.ts"), RelType::DependsOn, &express).is_some());
        assert!(graph.edge(&file_ref("src/util.ts"), RelType::DependsOn, &express).is_some());
        assert_eq!(report.external_dependencies, 2);
    }

    #[tokio::test]
    async fn test_internal_import_resolves_by_substring() {
        let store = MemoryStore::new();
        let report = import_analysis(&store, &sample_analysis(), "P1", "demo").await.unwrap();

        let graph = store.snapshot();
        let edge = graph
            .edge(&file_ref("src/service.ts"), RelType::Imports, &file_ref("src/util.ts"))
            .unwrap();
        assert_eq!(edge["import_type"], "internal");
        assert_eq!(edge["resolved"], true);
        assert_eq!(report.internal_imports, 1);
        assert!(graph.node(NodeLabel::Import, "src/service.ts->util").is_some());
        assert!(graph.node(NodeLabel::Import, "src/service.ts->express").is_some());
        assert!(graph.edge(&file_ref("src/service.ts"), RelType::DependsOn, &NodeRef::new(NodeLabel::ExternalDependency, "util")).is_none());
    }

    #[tokio::test]
    async fn test_node_failure_aborts_whole_import() {
        let store = MemoryStore::new().failing_on(|stmt| {
            matches!(stmt, Statement::MergeNode { node, .. } if node.key == "src/util.ts#log")
        });

        let err = import_analysis(&store, &sample_analysis(), "P1", "demo").await.unwrap_err();

        assert!(matches!(err, CodemapError::WriteFailure(ref m) if m.contains("src/util.ts")));
        assert!(store.snapshot().nodes.is_empty());
        assert_eq!(store.commits(), 0);
        assert_eq!(store.rollbacks(), 1);
    }

    #[tokio::test]
    async fn test_link_failure_is_not_fatal() {
        let store = MemoryStore::new().failing_on(|stmt| {
            matches!(stmt, Statement::MergeEdge { rel: RelType::Calls, .. })
        });

        let report = import_analysis(&store, &sample_analysis(), "P1", "demo").await.unwrap();

        let graph = store.snapshot();
        assert_eq!(graph.count_edges(RelType::Calls), 0);
        assert_eq!(graph.count_edges(RelType::Returns), 1);
        assert_eq!(report.calls_resolved, 0);
        let failures = report
            .diagnostics
            .iter()
            .filter(|d| matches!(d, ImportDiagnostic::LinkFailed { link: LinkKind::Call, .. }))
            .count();
        assert_eq!(failures, 2);
    }

    #[tokio::test]
    async fn test_file_with_analyzer_error_is_imported() {
        let store = MemoryStore::new();
        let mut broken = file("broken.js", vec![func("partial", &[])]);
        broken.error = Some("Unexpected token".to_string());

        let report = import_analysis(&store, &Analysis { files: vec![broken] }, "P1", "demo").await.unwrap();

        let graph = store.snapshot();
        assert_eq!(graph.node(NodeLabel::File, "broken.js").unwrap()["analysis_error"], "Unexpected token");
        assert!(graph.node(NodeLabel::Function, "broken.js#partial").is_some());
        assert_eq!(report.link_issues(), 0);
        assert!(matches!(report.diagnostics[0], ImportDiagnostic::AnalyzerError { .. }));
    }

    #[tokio::test]
    async fn test_unknown_method_owner_is_unresolved() {
        let store = MemoryStore::new();
        let mut orphan = func("render", &[]);
        orphan.is_method_of = Some("Widget".to_string());

        let report = import_analysis(&store, &Analysis { files: vec![file("w.js", vec![orphan])] }, "P1", "demo")
            .await
            .unwrap();

        assert_eq!(store.snapshot().count_edges(RelType::OwnsMethod), 0);
        assert_eq!(
            report.diagnostics,
            vec![ImportDiagnostic::Unresolved {
                link: LinkKind::MethodOwner,
                from: "w.js#render".to_string(),
                target: "Widget".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_malformed_input_writes_nothing() {
        let store = MemoryStore::new();

        let err = import_analysis(&store, &sample_analysis(), "  ", "demo").await.unwrap_err();
        assert!(matches!(err, CodemapError::IngestMalformed(_)));

        let nameless = Analysis { files: vec![file("", vec![])] };
        let err = import_analysis(&store, &nameless, "P1", "demo").await.unwrap_err();
        assert!(matches!(err, CodemapError::IngestMalformed(_)));

        assert!(store.statements().is_empty());
    }

    #[tokio::test]
    async fn test_set_project_status() {
        let store = MemoryStore::new();
        import_analysis(&store, &sample_analysis(), "P1", "demo").await.unwrap();
        assert_eq!(store.snapshot().node(NodeLabel::Project, "P1").unwrap()["status"], "processing");

        set_project_status(&store, "P1", ProjectStatus::Completed).await.unwrap();

        let graph = store.snapshot();
        let project = graph.node(NodeLabel::Project, "P1").unwrap();
        assert_eq!(project["status"], "completed");
        assert_eq!(project["name"], "demo");
        assert!(project.contains_key("updated_at"));
    }
}
