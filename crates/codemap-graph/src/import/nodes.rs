//! Node pass: every node, its structural edge, and its project ownership.
//!
//! Creates:
//! - (:Project {id})
//! - (:File)-[:BELONGS_TO]->(:Project)
//! - (:File)-[:CONTAINS]->(:Class)-[:BELONGS_TO]->(:Project)
//! - (:Class)-[:HAS_PROPERTY]->(:Property)
//! - (:File)-[:CONTAINS]->(:Function)-[:BELONGS_TO]->(:Project)
//! - (:Function)-[:HAS_PARAMETER]->(:Parameter)
//! - (:File)-[:HAS_IMPORT]->(:Import)
//!
//! Any failure here is fatal to the import.

use serde_json::json;
use tracing::debug;

use codemap_core::analysis::keys;
use codemap_core::{CodemapResult, ProjectStatus, SourceFile};

use super::{run_counted, ImportReport};
use crate::statement::{props, NodeLabel, NodeRef, RelType, Statement};
use crate::store::GraphTransaction;

/// Create the Project node. Attributes are only set on first import.
pub(super) async fn merge_project(
    tx: &mut dyn GraphTransaction,
    project: &NodeRef,
    project_name: &str,
    report: &mut ImportReport,
) -> CodemapResult<()> {
    let stmt = Statement::merge_node(
        project.clone(),
        props(json!({
            "name": project_name,
            "status": ProjectStatus::Processing.as_str(),
            "created_at": chrono::Utc::now().to_rfc3339(),
        })),
    );
    run_counted(tx, &stmt, report).await?;
    Ok(())
}

/// Create all nodes declared by one file.
pub(super) async fn merge_file(
    tx: &mut dyn GraphTransaction,
    file: &SourceFile,
    project: &NodeRef,
    report: &mut ImportReport,
) -> CodemapResult<()> {
    let file_ref = NodeRef::new(NodeLabel::File, file.path.as_str());

    let mut file_props = props(json!({ "language": file.language }));
    if let Some(error) = file.analyzer_error() {
        file_props.insert("analysis_error".to_string(), json!(error));
    }
    run_counted(tx, &Statement::merge_node(file_ref.clone(), file_props), report).await?;
    run_counted(tx, &Statement::merge_edge(file_ref.clone(), RelType::BelongsTo, project.clone()), report).await?;

    for class in &file.classes {
        let class_ref = NodeRef::new(NodeLabel::Class, keys::class_key(&file.path, &class.name));
        let node = Statement::merge_node(
            class_ref.clone(),
            props(json!({
                "name": class.name,
                "is_exported": class.is_exported,
                "file": file.path,
            })),
        );
        run_counted(tx, &node, report).await?;
        run_counted(tx, &Statement::merge_edge(file_ref.clone(), RelType::Contains, class_ref.clone()), report).await?;
        run_counted(tx, &Statement::merge_edge(class_ref.clone(), RelType::BelongsTo, project.clone()), report).await?;

        for property in &class.properties {
            let prop_ref = NodeRef::new(NodeLabel::Property, keys::property_key(&class_ref.key, property));
            run_counted(tx, &Statement::merge_node(prop_ref.clone(), props(json!({ "name": property }))), report).await?;
            run_counted(tx, &Statement::merge_edge(class_ref.clone(), RelType::HasProperty, prop_ref), report).await?;
        }
    }

    for function in &file.functions {
        let fn_ref = NodeRef::new(NodeLabel::Function, keys::function_key(&file.path, &function.name));
        let node = Statement::merge_node(
            fn_ref.clone(),
            props(json!({
                "name": function.name,
                "is_exported": function.is_exported,
                "is_method_of": function.method_of(),
                "return_types": function.return_types,
                "param_count": function.params.len(),
                "file": file.path,
            })),
        );
        run_counted(tx, &node, report).await?;
        run_counted(tx, &Statement::merge_edge(file_ref.clone(), RelType::Contains, fn_ref.clone()), report).await?;
        run_counted(tx, &Statement::merge_edge(fn_ref.clone(), RelType::BelongsTo, project.clone()), report).await?;

        for (index, param) in function.params.iter().enumerate() {
            let param_ref = NodeRef::new(NodeLabel::Parameter, keys::parameter_key(&fn_ref.key, param));
            let node = Statement::merge_node(param_ref.clone(), props(json!({ "name": param, "position": index + 1 })));
            run_counted(tx, &node, report).await?;
            run_counted(tx, &Statement::merge_edge(fn_ref.clone(), RelType::HasParameter, param_ref), report).await?;
        }
    }

    for import in file.imports.iter().filter(|i| !i.source.is_empty()) {
        let import_ref = NodeRef::new(NodeLabel::Import, keys::import_key(&file.path, &import.source));
        let node = Statement::merge_node(
            import_ref.clone(),
            props(json!({ "source": import.source, "from_file": file.path })),
        );
        run_counted(tx, &node, report).await?;
        run_counted(tx, &Statement::merge_edge(file_ref.clone(), RelType::HasImport, import_ref), report).await?;
    }

    debug!(
        path = %file.path,
        classes = file.classes.len(),
        functions = file.functions.len(),
        imports = file.imports.len(),
        "Merged file nodes"
    );
    Ok(())
}
