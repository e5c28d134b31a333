//! Definition validation: referential integrity and routing consistency.

use crate::config::resolved::fold_path;
use crate::config::ApiDefinition;
use crate::error::ConfigError;
use std::collections::{HashMap, HashSet};

/// Path segments the router answers itself.
pub const RESERVED_SEGMENTS: [&str; 2] = ["openapi.json", "doc"];

pub fn validate(def: &ApiDefinition) -> Result<(), ConfigError> {
    if def.api_pack.trim().is_empty() {
        return Err(ConfigError::Validation("apiPack is required".into()));
    }

    let mut paths = HashSet::new();
    for r in &def.resources {
        let path = r.resource_path.as_str();
        if path.is_empty() || path.contains('/') || path.trim() != path {
            return Err(ConfigError::Validation(format!(
                "resourcePath '{}' must be a single non-empty path segment",
                path
            )));
        }
        if RESERVED_SEGMENTS.iter().any(|s| s.eq_ignore_ascii_case(path)) {
            return Err(ConfigError::ReservedPath(path.to_string()));
        }
        if !paths.insert(fold_path(path, def.case_sensitive_routes)) {
            return Err(ConfigError::DuplicatePathSegment(path.to_string()));
        }
        if r.module.is_empty() || r.business_object.is_empty() {
            return Err(ConfigError::Validation(format!(
                "resource {} needs module and businessObject",
                path
            )));
        }
        if let Some(report) = &r.report {
            if report.query_name.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "resource {} report needs a queryName",
                    path
                )));
            }
        }

        let mut internal = HashSet::new();
        let mut exposed = HashSet::new();
        for f in &r.fields {
            if !internal.insert(f.name.as_str()) {
                return Err(ConfigError::DuplicateField {
                    resource: path.to_string(),
                    kind: "internal",
                    name: f.name.clone(),
                });
            }
            if !exposed.insert(f.exposed_name.as_str()) {
                return Err(ConfigError::DuplicateField {
                    resource: path.to_string(),
                    kind: "exposed",
                    name: f.exposed_name.clone(),
                });
            }
        }
    }

    let by_path: HashMap<&str, _> = def
        .resources
        .iter()
        .map(|r| (r.resource_path.as_str(), r))
        .collect();
    for r in &def.resources {
        let Some(parent) = &r.parent else { continue };
        let target = by_path
            .get(parent.resource.as_str())
            .ok_or_else(|| ConfigError::MissingReference {
                kind: "parent resource",
                id: parent.resource.clone(),
            })?;
        if target.resource_path == r.resource_path {
            return Err(ConfigError::Validation(format!(
                "resource {} cannot be its own parent",
                r.resource_path
            )));
        }
        if target.parent.is_some() {
            return Err(ConfigError::Validation(format!(
                "resource {} nests under {}, which is itself nested; one level is supported",
                r.resource_path, parent.resource
            )));
        }
        if parent.association_name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "resource {} needs an associationName for its parent",
                r.resource_path
            )));
        }
        if parent.parent_id_param.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "resource {} needs a parentIdParam",
                r.resource_path
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn def(value: serde_json::Value) -> ApiDefinition {
        serde_json::from_value(value).unwrap()
    }

    fn base() -> serde_json::Value {
        json!({
            "apiPack": "kvxapi",
            "resources": [
                { "resourcePath": "worktasks", "module": "triTask", "businessObject": "triWorkTask", "formName": "triWorkTask",
                  "fields": [{ "name": "triTitle", "exposedName": "title" }] },
                { "resourcePath": "comments", "module": "triComment", "businessObject": "triComment", "formName": "triComment",
                  "parent": { "resource": "worktasks", "parentIdParam": "worktaskId", "associationName": "Has Comment" } }
            ]
        })
    }

    #[test]
    fn accepts_valid_definition() {
        validate(&def(base())).unwrap();
    }

    #[test]
    fn rejects_empty_pack() {
        let mut v = base();
        v["apiPack"] = json!(" ");
        assert!(matches!(validate(&def(v)), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn rejects_reserved_and_duplicate_paths() {
        let mut v = base();
        v["resources"][0]["resourcePath"] = json!("doc");
        assert!(matches!(validate(&def(v)), Err(ConfigError::ReservedPath(_))));

        let mut v = base();
        v["resources"][1]["resourcePath"] = json!("WorkTasks");
        v["resources"][1]["parent"] = serde_json::Value::Null;
        assert!(matches!(validate(&def(v.clone())), Err(ConfigError::DuplicatePathSegment(_))));
        v["caseSensitiveRoutes"] = json!(true);
        validate(&def(v)).unwrap();
    }

    #[test]
    fn rejects_duplicate_fields() {
        let mut v = base();
        v["resources"][0]["fields"] = json!([
            { "name": "triTitle", "exposedName": "title" },
            { "name": "triNameTX", "exposedName": "title" }
        ]);
        assert!(matches!(
            validate(&def(v)),
            Err(ConfigError::DuplicateField { kind: "exposed", .. })
        ));
    }

    #[test]
    fn rejects_bad_parents() {
        let mut v = base();
        v["resources"][1]["parent"]["resource"] = json!("projects");
        assert!(matches!(validate(&def(v)), Err(ConfigError::MissingReference { .. })));

        let mut v = base();
        v["resources"][1]["parent"]["associationName"] = json!("");
        assert!(matches!(validate(&def(v)), Err(ConfigError::Validation(_))));

        let mut v = base();
        v["resources"][0]["parent"] =
            json!({ "resource": "comments", "parentIdParam": "commentId", "associationName": "x" });
        assert!(validate(&def(v)).is_err());
    }
}
