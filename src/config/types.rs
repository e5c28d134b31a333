//! Raw API definition types matching the generated api-definition JSON (camelCase keys).

use serde::{Deserialize, Serialize};

/// Standard record id field of the remote store.
pub const DEFAULT_ID_FIELD: &str = "triRecordIdSY";

/// Section used when a field does not name one.
pub const DEFAULT_SECTION: &str = "General";

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldConfig {
    /// Internal field name in the remote store.
    pub name: String,
    pub exposed_name: String,
    #[serde(rename = "type", default = "default_type")]
    pub type_: String,
    #[serde(default)]
    pub mandatory: bool,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default = "default_section")]
    pub section: String,
}

fn default_type() -> String {
    "Text".into()
}

fn default_section() -> String {
    DEFAULT_SECTION.into()
}

fn default_id_field() -> String {
    DEFAULT_ID_FIELD.into()
}

/// Named report (store-side query) backing list and read-by-id for a resource.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportConfig {
    pub query_name: String,
    /// Field the single-row lookup filters on. Defaults to the resource's id field.
    #[serde(default)]
    pub id_field_name: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentConfig {
    /// resourcePath of the parent resource.
    pub resource: String,
    /// Name of the parent id path parameter (e.g. "worktaskId").
    pub parent_id_param: String,
    pub association_name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceConfig {
    pub resource_path: String,
    pub module: String,
    pub business_object: String,
    pub form_name: String,
    #[serde(default = "default_id_field")]
    pub id_field_name: String,
    #[serde(default)]
    pub report: Option<ReportConfig>,
    #[serde(default)]
    pub parent: Option<ParentConfig>,
    #[serde(default)]
    pub fields: Vec<FieldConfig>,
}

/// Whole API definition for one generated adapter.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiDefinition {
    pub api_pack: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub api_base_path: String,
    #[serde(default)]
    pub case_sensitive_routes: bool,
    #[serde(default)]
    pub resources: Vec<ResourceConfig>,
}
