//! Relationship pass: imports, class methods, calls and return types.
//!
//! Runs only after every file's nodes exist, so link targets defined in
//! files later in the document are already present. Every statement here
//! is best-effort: a failure or an unresolvable target is recorded as a
//! diagnostic and the pass moves on.

use std::collections::HashSet;

use serde_json::json;
use tracing::{debug, warn};

use codemap_core::analysis::keys;
use codemap_core::{Analysis, FunctionDef, SourceFile};

use super::resolve;
use super::{run_counted, ImportDiagnostic, ImportReport, LinkKind};
use crate::statement::{props, NodeLabel, NodeRef, Properties, RelType, Statement};
use crate::store::GraphTransaction;
use crate::value::{record_str, GraphValue, Record};

/// Analysis-wide lookups shared by every file's link pass.
pub(super) struct LinkContext<'a> {
    analysis: &'a Analysis,
    function_keys: HashSet<String>,
}

impl<'a> LinkContext<'a> {
    pub fn new(analysis: &'a Analysis) -> Self {
        let function_keys = analysis
            .files
            .iter()
            .flat_map(|file| file.functions.iter().map(|f| keys::function_key(&file.path, &f.name)))
            .collect();
        Self { analysis, function_keys }
    }
}

/// A resolved call target.
struct Callee {
    key: String,
    is_method: bool,
}

pub(super) async fn link_file(
    tx: &mut dyn GraphTransaction,
    ctx: &LinkContext<'_>,
    file: &SourceFile,
    report: &mut ImportReport,
) {
    let file_ref = NodeRef::new(NodeLabel::File, file.path.as_str());

    for import in file.imports.iter().filter(|i| !i.source.is_empty()) {
        link_import(tx, ctx, &file_ref, &import.source, report).await;
    }

    for class in &file.classes {
        let class_ref = NodeRef::new(NodeLabel::Class, keys::class_key(&file.path, &class.name));
        for method in &class.methods {
            if file.function(method).is_none() {
                report.unresolved(LinkKind::ClassMethod, &class_ref.key, method);
                continue;
            }
            let fn_ref = NodeRef::new(NodeLabel::Function, keys::function_key(&file.path, method));
            let stmt = Statement::merge_edge(class_ref.clone(), RelType::HasMethod, fn_ref)
                .with_edge_props(props(json!({ "method_name": method })));
            best_effort(tx, &stmt, LinkKind::ClassMethod, &class_ref.key, method, report).await;
        }
    }

    for function in &file.functions {
        let fn_ref = NodeRef::new(NodeLabel::Function, keys::function_key(&file.path, &function.name));

        if let Some(owner) = function.method_of() {
            link_owner(tx, file, &fn_ref, owner, report).await;
        }

        for (index, callee_name) in function.calls.iter().enumerate() {
            link_call(tx, ctx, file, &fn_ref, callee_name, index + 1, report).await;
        }

        for return_type in function.linked_return_types() {
            let rt_ref = NodeRef::new(NodeLabel::ReturnType, return_type);
            let node = Statement::merge_node(rt_ref.clone(), Properties::new());
            if best_effort(tx, &node, LinkKind::ReturnType, &fn_ref.key, return_type, report).await {
                let edge = Statement::merge_edge(fn_ref.clone(), RelType::Returns, rt_ref);
                best_effort(tx, &edge, LinkKind::ReturnType, &fn_ref.key, return_type, report).await;
            }
        }
    }
}

/// IMPORTS to a known file, or DEPENDS_ON an ExternalDependency.
async fn link_import(
    tx: &mut dyn GraphTransaction,
    ctx: &LinkContext<'_>,
    file_ref: &NodeRef,
    source: &str,
    report: &mut ImportReport,
) {
    let Some(rows) = lookup(tx, Statement::FindFiles { fragment: source.to_string() }, LinkKind::Import, &file_ref.key, source, report).await else {
        return;
    };

    let candidates = rows
        .iter()
        .filter_map(|row| {
            let path = record_str(row, "path")?;
            // A file never imports itself.
            if path == file_ref.key {
                return None;
            }
            let suffix_match = row.get("suffix_match").and_then(GraphValue::as_bool).unwrap_or(false);
            Some((resolve::import_rank(ctx.analysis.contains_path(path), suffix_match), path.to_string()))
        })
        .collect();

    let resolution = resolve::pick(candidates);
    report.note_ambiguity(LinkKind::Import, &file_ref.key, source, &resolution);

    match resolution.target() {
        Some(target) => {
            let stmt = Statement::merge_edge(file_ref.clone(), RelType::Imports, NodeRef::new(NodeLabel::File, target))
                .with_edge_props(props(json!({
                    "source": source,
                    "import_type": "internal",
                    "resolved": true,
                })));
            if best_effort(tx, &stmt, LinkKind::Import, &file_ref.key, source, report).await {
                report.internal_imports += 1;
            }
        }
        None => {
            let dep_ref = NodeRef::new(NodeLabel::ExternalDependency, source);
            let node = Statement::merge_node(dep_ref.clone(), props(json!({ "type": "library" })));
            if !best_effort(tx, &node, LinkKind::Import, &file_ref.key, source, report).await {
                return;
            }
            let stmt = Statement::merge_edge(file_ref.clone(), RelType::DependsOn, dep_ref)
                .with_edge_props(props(json!({
                    "source": source,
                    "import_type": "external",
                    "resolved": false,
                })));
            if best_effort(tx, &stmt, LinkKind::Import, &file_ref.key, source, report).await {
                report.external_dependencies += 1;
            }
        }
    }
}

/// OWNS_METHOD from the declaring class, and mark the function as a method.
async fn link_owner(
    tx: &mut dyn GraphTransaction,
    file: &SourceFile,
    fn_ref: &NodeRef,
    owner: &str,
    report: &mut ImportReport,
) {
    if !file.has_class(owner) {
        report.unresolved(LinkKind::MethodOwner, &fn_ref.key, owner);
        return;
    }
    let class_ref = NodeRef::new(NodeLabel::Class, keys::class_key(&file.path, owner));
    let edge = Statement::merge_edge(class_ref, RelType::OwnsMethod, fn_ref.clone());
    if best_effort(tx, &edge, LinkKind::MethodOwner, &fn_ref.key, owner, report).await {
        let mark = Statement::SetProperties {
            node: fn_ref.clone(),
            properties: props(json!({ "is_method": true })),
        };
        best_effort(tx, &mark, LinkKind::MethodOwner, &fn_ref.key, owner, report).await;
    }
}

/// CALLS to the same-file function of that name, else the best graph-wide match.
async fn link_call(
    tx: &mut dyn GraphTransaction,
    ctx: &LinkContext<'_>,
    file: &SourceFile,
    caller: &NodeRef,
    callee_name: &str,
    call_order: usize,
    report: &mut ImportReport,
) {
    let callee = match file.function(callee_name) {
        Some(local) => same_file_callee(file, local),
        None => match global_callee(tx, ctx, caller, callee_name, report).await {
            Some(callee) => callee,
            None => return,
        },
    };

    let stmt = Statement::merge_edge(caller.clone(), RelType::Calls, NodeRef::new(NodeLabel::Function, callee.key.as_str()))
        .with_edge_props(props(json!({
            "function_name": callee_name,
            "call_order": call_order,
            "call_type": if callee.is_method { "method" } else { "function" },
        })));
    if best_effort(tx, &stmt, LinkKind::Call, &caller.key, callee_name, report).await {
        report.calls_resolved += 1;
    }
}

fn same_file_callee(file: &SourceFile, function: &FunctionDef) -> Callee {
    Callee {
        key: keys::function_key(&file.path, &function.name),
        is_method: function.method_of().is_some(),
    }
}

async fn global_callee(
    tx: &mut dyn GraphTransaction,
    ctx: &LinkContext<'_>,
    caller: &NodeRef,
    callee_name: &str,
    report: &mut ImportReport,
) -> Option<Callee> {
    let rows = lookup(tx, Statement::FindFunctions { name: callee_name.to_string() }, LinkKind::Call, &caller.key, callee_name, report).await?;

    let candidates = rows
        .iter()
        .filter_map(|row| record_str(row, "id"))
        .map(|id| (resolve::call_rank(ctx.function_keys.contains(id)), id.to_string()))
        .collect();

    let resolution = resolve::pick(candidates);
    report.note_ambiguity(LinkKind::Call, &caller.key, callee_name, &resolution);

    let Some(key) = resolution.target() else {
        report.unresolved(LinkKind::Call, &caller.key, callee_name);
        return None;
    };
    let is_method = rows
        .iter()
        .find(|row| record_str(row, "id") == Some(key))
        .and_then(|row| record_str(row, "is_method_of"))
        .is_some_and(|owner| !owner.is_empty());

    Some(Callee { key: key.to_string(), is_method })
}

/// Run a lookup, recording a diagnostic on failure.
async fn lookup(
    tx: &mut dyn GraphTransaction,
    stmt: Statement,
    kind: LinkKind,
    from: &str,
    target: &str,
    report: &mut ImportReport,
) -> Option<Vec<Record>> {
    match tx.run(&stmt).await {
        Ok(rows) => Some(rows),
        Err(err) => {
            warn!(?kind, from, target, error = %err, "Link target lookup failed");
            report.diagnostics.push(ImportDiagnostic::LinkFailed {
                link: kind,
                from: from.to_string(),
                target: target.to_string(),
                error: err.to_string(),
            });
            None
        }
    }
}

/// Run a statement, recording a diagnostic instead of failing. Returns success.
async fn best_effort(
    tx: &mut dyn GraphTransaction,
    stmt: &Statement,
    kind: LinkKind,
    from: &str,
    target: &str,
    report: &mut ImportReport,
) -> bool {
    match run_counted(tx, stmt, report).await {
        Ok(()) => {
            debug!(?kind, from, target, "Linked");
            true
        }
        Err(err) => {
            warn!(?kind, from, target, error = %err, "Could not create relationship");
            report.diagnostics.push(ImportDiagnostic::LinkFailed {
                link: kind,
                from: from.to_string(),
                target: target.to_string(),
                error: err.to_string(),
            });
            false
        }
    }
}
