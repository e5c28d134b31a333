//! Request body checks driven by field metadata.

use crate::error::AppError;
use crate::mapping::FieldMapper;
use serde_json::{Map, Value};

pub struct RequestValidator;

impl RequestValidator {
    pub fn body_object(body: &Value) -> Result<&Map<String, Value>, AppError> {
        body.as_object()
            .ok_or_else(|| AppError::BadRequest("Request body must be a JSON object".into()))
    }

    /// Every mandatory field must be present and non-empty (create only).
    pub fn require_mandatory(mapper: &FieldMapper, body: &Map<String, Value>) -> Result<(), AppError> {
        let missing: Vec<&str> = mapper
            .fields()
            .iter()
            .filter(|f| f.mandatory && !f.read_only)
            .filter(|f| match body.get(&f.exposed) {
                None | Some(Value::Null) => true,
                Some(Value::String(s)) => s.trim().is_empty(),
                Some(_) => false,
            })
            .map(|f| f.exposed.as_str())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(AppError::BadRequest(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )))
        }
    }

    /// Internal (name, value) pairs to write: mapped fields minus read-only ones.
    pub fn writable_fields(mapper: &FieldMapper, body: &Map<String, Value>) -> Vec<(String, String)> {
        mapper
            .to_internal(body)
            .into_iter()
            .filter(|(name, _)| {
                let read_only = mapper.by_internal(name).map(|m| m.read_only).unwrap_or(false);
                if read_only {
                    tracing::debug!(field = %name, "dropping read-only field from write");
                }
                !read_only
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FieldConfig;
    use serde_json::json;

    fn mapper() -> FieldMapper {
        let fields: Vec<FieldConfig> = serde_json::from_value(json!([
            { "name": "triTitle", "exposedName": "title", "mandatory": true },
            { "name": "triPriorityCL", "exposedName": "priority", "mandatory": true },
            { "name": "triRecordIdSY", "exposedName": "id", "readOnly": true, "mandatory": true }
        ]))
        .unwrap();
        FieldMapper::new(&fields)
    }

    #[test]
    fn missing_mandatory_fields_are_listed() {
        let body = json!({ "title": "  ", "other": 1 });
        let err = RequestValidator::require_mandatory(&mapper(), body.as_object().unwrap()).unwrap_err();
        assert_eq!(err.public_message(), "Missing required fields: title, priority.");
    }

    #[test]
    fn read_only_fields_are_not_written() {
        let body = json!({ "title": "x", "id": "5" });
        let out = RequestValidator::writable_fields(&mapper(), body.as_object().unwrap());
        assert_eq!(out, vec![("triTitle".to_string(), "x".to_string())]);
    }

    #[test]
    fn body_must_be_an_object() {
        assert!(RequestValidator::body_object(&json!([1, 2])).is_err());
        assert!(RequestValidator::body_object(&json!({})).is_ok());
    }
}
