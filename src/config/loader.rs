//! Load an API definition from JSON and resolve it into the runtime model.

use crate::config::resolved::{fold_path, report_name, ParentLink, ReportDescriptor, ResolvedModel, ResolvedResource};
use crate::config::{validate, ApiDefinition};
use crate::error::ConfigError;
use crate::mapping::FieldMapper;
use std::collections::HashMap;
use std::path::Path;

pub fn load_from_str(json: &str) -> Result<ApiDefinition, ConfigError> {
    serde_json::from_str(json).map_err(|e| ConfigError::Load(e.to_string()))
}

pub async fn load_from_path(path: impl AsRef<Path>) -> Result<ApiDefinition, ConfigError> {
    let path = path.as_ref();
    tracing::debug!(path = %path.display(), "loading api definition");
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    load_from_str(&text)
}

/// Build the resolved model (validates first).
pub fn resolve(def: &ApiDefinition) -> Result<ResolvedModel, ConfigError> {
    validate(def)?;

    let mut resources = Vec::with_capacity(def.resources.len());
    let mut resource_by_path = HashMap::new();
    let mut reports = HashMap::new();

    for r in &def.resources {
        if let Some(report) = &r.report {
            let descriptor = ReportDescriptor {
                name: report_name(&r.business_object),
                module: r.module.clone(),
                business_object: r.business_object.clone(),
                query_name: report.query_name.clone(),
                id_field: report
                    .id_field_name
                    .clone()
                    .unwrap_or_else(|| r.id_field_name.clone()),
            };
            if let Some(prev) = reports.insert(descriptor.name.clone(), descriptor) {
                tracing::warn!(report = %prev.name, "business object reported twice; last definition wins");
            }
        }

        let resource = ResolvedResource {
            resource_path: r.resource_path.clone(),
            module: r.module.clone(),
            business_object: r.business_object.clone(),
            form_name: r.form_name.clone(),
            id_field_name: r.id_field_name.clone(),
            parent: r.parent.as_ref().map(|p| ParentLink {
                resource: p.resource.clone(),
                parent_id_param: p.parent_id_param.clone(),
                association_name: p.association_name.clone(),
            }),
            mapper: FieldMapper::new(&r.fields),
        };
        resource_by_path.insert(fold_path(&r.resource_path, def.case_sensitive_routes), resources.len());
        resources.push(resource);
    }

    tracing::info!(
        api_pack = %def.api_pack,
        resources = resources.len(),
        reports = reports.len(),
        "api definition resolved"
    );

    Ok(ResolvedModel {
        api_pack: def.api_pack.clone(),
        version: def.version.clone(),
        base_path: def.api_base_path.trim_end_matches('/').to_string(),
        case_sensitive: def.case_sensitive_routes,
        resources,
        resource_by_path,
        reports,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFINITION: &str = r#"{
        "apiPack": "kvxapi",
        "version": "v1",
        "apiBasePath": "/kvxapi/",
        "resources": [
            {
                "resourcePath": "worktasks",
                "module": "triTask",
                "businessObject": "triWorkTask",
                "formName": "triWorkTask",
                "report": { "queryName": "kvx - triTask - triWorkTask - Work Task" },
                "fields": [{ "name": "triTitle", "exposedName": "title" }]
            },
            {
                "resourcePath": "comments",
                "module": "triComment",
                "businessObject": "triComment",
                "formName": "triComment",
                "idFieldName": "triCommentIdTX",
                "report": { "queryName": "Comments", "idFieldName": "triRecordIdSY" },
                "parent": { "resource": "worktasks", "parentIdParam": "worktaskId", "associationName": "Has Comment" }
            }
        ]
    }"#;

    #[test]
    fn resolves_registry_and_defaults() {
        let model = resolve(&load_from_str(DEFINITION).unwrap()).unwrap();
        assert_eq!(model.base_path, "/kvxapi");
        assert!(!model.case_sensitive);

        let wt = model.resource("WorkTasks").unwrap();
        assert_eq!(wt.id_field_name, "triRecordIdSY");
        assert_eq!(wt.mapper.internal_name("title"), Some("triTitle"));

        let report = model.report_for("triWorkTask").unwrap();
        assert_eq!(report.name, "Report_triWorkTask");
        assert_eq!(report.id_field, "triRecordIdSY");

        let comments = model.resource("comments").unwrap();
        assert_eq!(comments.parent.as_ref().unwrap().association_name, "Has Comment");
        assert_eq!(model.report_for("triComment").unwrap().id_field, "triRecordIdSY");
    }

    #[test]
    fn malformed_json_is_a_load_error() {
        assert!(matches!(load_from_str("{"), Err(ConfigError::Load(_))));
    }

    #[tokio::test]
    async fn missing_file_is_a_load_error() {
        let err = load_from_path("/nonexistent/api-definition.json").await.unwrap_err();
        assert!(matches!(err, ConfigError::Load(_)));
    }
}
