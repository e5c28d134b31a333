//! Resolved adapter model: definition validated and flattened for runtime use.

use crate::mapping::FieldMapper;
use std::collections::HashMap;

/// Store-side named query backing list and read-by-id for one business object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportDescriptor {
    /// Registry key, `Report_<businessObject>`.
    pub name: String,
    pub module: String,
    pub business_object: String,
    pub query_name: String,
    /// Internal field the single-row lookup filters on.
    pub id_field: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParentLink {
    pub resource: String,
    pub parent_id_param: String,
    pub association_name: String,
}

#[derive(Clone, Debug)]
pub struct ResolvedResource {
    pub resource_path: String,
    pub module: String,
    pub business_object: String,
    pub form_name: String,
    /// Internal id field; set on every outbound record.
    pub id_field_name: String,
    pub parent: Option<ParentLink>,
    pub mapper: FieldMapper,
}

#[derive(Clone, Debug)]
pub struct ResolvedModel {
    pub api_pack: String,
    pub version: Option<String>,
    pub base_path: String,
    pub case_sensitive: bool,
    pub resources: Vec<ResolvedResource>,
    /// Keyed by resource path, lowercased unless routing is case-sensitive.
    pub resource_by_path: HashMap<String, usize>,
    /// Keyed by [`report_name`].
    pub reports: HashMap<String, ReportDescriptor>,
}

/// Registry key of the named report for a business object.
pub fn report_name(business_object: &str) -> String {
    format!("Report_{}", business_object)
}

impl ResolvedModel {
    pub fn path_key(&self, segment: &str) -> String {
        fold_path(segment, self.case_sensitive)
    }

    pub fn resource(&self, segment: &str) -> Option<&ResolvedResource> {
        self.resource_by_path
            .get(&self.path_key(segment))
            .map(|&i| &self.resources[i])
    }

    pub fn report_for(&self, business_object: &str) -> Option<&ReportDescriptor> {
        self.reports.get(&report_name(business_object))
    }
}

pub(crate) fn fold_path(segment: &str, case_sensitive: bool) -> String {
    if case_sensitive {
        segment.to_string()
    } else {
        segment.to_lowercase()
    }
}
