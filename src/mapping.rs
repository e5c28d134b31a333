//! Field translation between exposed JSON keys and internal store field names.

use crate::config::FieldConfig;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Per-field metadata resolved from the API definition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldMeta {
    pub internal: String,
    pub exposed: String,
    pub data_type: String,
    pub mandatory: bool,
    pub read_only: bool,
    pub section: String,
}

impl From<&FieldConfig> for FieldMeta {
    fn from(f: &FieldConfig) -> Self {
        FieldMeta {
            internal: f.name.clone(),
            exposed: f.exposed_name.clone(),
            data_type: f.type_.clone(),
            mandatory: f.mandatory,
            read_only: f.read_only,
            section: f.section.clone(),
        }
    }
}

/// Bidirectional name mapping for one resource. Both name sets are unique (checked at config validation).
#[derive(Clone, Debug, Default)]
pub struct FieldMapper {
    fields: Vec<FieldMeta>,
    by_exposed: HashMap<String, usize>,
    by_internal: HashMap<String, usize>,
}

impl FieldMapper {
    pub fn new(fields: &[FieldConfig]) -> Self {
        let fields: Vec<FieldMeta> = fields.iter().map(FieldMeta::from).collect();
        let by_exposed = fields
            .iter()
            .enumerate()
            .map(|(i, f)| (f.exposed.clone(), i))
            .collect();
        let by_internal = fields
            .iter()
            .enumerate()
            .map(|(i, f)| (f.internal.clone(), i))
            .collect();
        FieldMapper {
            fields,
            by_exposed,
            by_internal,
        }
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[FieldMeta] {
        &self.fields
    }

    pub fn by_exposed(&self, exposed: &str) -> Option<&FieldMeta> {
        self.by_exposed.get(exposed).map(|&i| &self.fields[i])
    }

    pub fn by_internal(&self, internal: &str) -> Option<&FieldMeta> {
        self.by_internal.get(internal).map(|&i| &self.fields[i])
    }

    pub fn internal_name(&self, exposed: &str) -> Option<&str> {
        self.by_exposed(exposed).map(|f| f.internal.as_str())
    }

    pub fn exposed_name(&self, internal: &str) -> Option<&str> {
        self.by_internal(internal).map(|f| f.exposed.as_str())
    }

    /// Exposed body to internal (name, value) pairs in declaration order.
    /// Keys without a mapping are dropped; values are rendered with [`store_value`].
    pub fn to_internal(&self, body: &Map<String, Value>) -> Vec<(String, String)> {
        self.fields
            .iter()
            .filter_map(|f| {
                body.get(&f.exposed)
                    .map(|v| (f.internal.clone(), store_value(v)))
            })
            .collect()
    }

    /// Internal (name, value) pairs to an exposed JSON object. Unmapped names pass through.
    pub fn to_exposed<I>(&self, fields: I) -> Map<String, Value>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        fields
            .into_iter()
            .map(|(name, value)| {
                let key = self
                    .exposed_name(&name)
                    .map(str::to_string)
                    .unwrap_or(name);
                (key, Value::String(value))
            })
            .collect()
    }
}

/// Store representation of a JSON value: strings as-is, null as empty, everything else as JSON text.
pub fn store_value(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn mapper() -> FieldMapper {
        let fields: Vec<FieldConfig> = serde_json::from_value(json!([
            { "name": "triTitle", "exposedName": "title", "mandatory": true },
            { "name": "triStatusCL", "exposedName": "status", "readOnly": true },
            { "name": "triHoursNU", "exposedName": "hours", "type": "Number", "section": "Details" }
        ]))
        .unwrap();
        FieldMapper::new(&fields)
    }

    #[test]
    fn to_internal_drops_unknown_and_stringifies() {
        let m = mapper();
        let body = json!({ "title": "Fix roof", "hours": 2.5, "status": null, "secret": "x" });
        let out = m.to_internal(body.as_object().unwrap());
        assert_eq!(
            out,
            vec![
                ("triTitle".to_string(), "Fix roof".to_string()),
                ("triStatusCL".to_string(), String::new()),
                ("triHoursNU".to_string(), "2.5".to_string()),
            ]
        );
    }

    #[test]
    fn booleans_are_stringified() {
        assert_eq!(store_value(&json!(true)), "true");
        assert_eq!(store_value(&json!(7)), "7");
    }

    #[test]
    fn to_exposed_passes_unmapped_through() {
        let m = mapper();
        let out = m.to_exposed(vec![
            ("triTitle".to_string(), "Fix roof".to_string()),
            ("triUnmodeledTX".to_string(), "raw".to_string()),
        ]);
        assert_eq!(out.get("title"), Some(&json!("Fix roof")));
        assert_eq!(out.get("triUnmodeledTX"), Some(&json!("raw")));
    }

    #[test]
    fn mapped_fields_survive_round_trip() {
        let m = mapper();
        let record = vec![
            ("triTitle".to_string(), "Fix roof".to_string()),
            ("triHoursNU".to_string(), "3".to_string()),
        ];
        let back = m.to_internal(&m.to_exposed(record.clone()));
        for pair in &record {
            assert!(back.contains(pair), "{pair:?} lost");
        }
    }

    #[test]
    fn metadata_lookup() {
        let m = mapper();
        assert!(m.by_exposed("title").unwrap().mandatory);
        assert!(m.by_internal("triStatusCL").unwrap().read_only);
        assert_eq!(m.by_exposed("hours").unwrap().section, "Details");
        assert_eq!(m.by_exposed("title").unwrap().section, "General");
        assert_eq!(m.internal_name("nope"), None);
    }
}
