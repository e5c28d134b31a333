//! Wire-level shapes exchanged with the record store client.

use serde::{Deserialize, Serialize};

/// Row label carrying the record id in named-query results.
pub const ROW_ID_LABEL: &str = "_id";

/// Section every report filter targets.
pub const FILTER_SECTION: &str = "General Info";

/// Section name the store reserves for record metadata; always written first.
pub const RECORD_INFORMATION_SECTION: &str = "RecordInformation";

/// Id the store expects on a record that does not exist yet.
pub const NEW_RECORD_ID: i64 = -1;

pub mod actions {
    pub const CREATE: &str = "triCreate";
    pub const SAVE: &str = "triSave";
    pub const DELETE: &str = "triDelete";
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrationField {
    pub name: String,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrationSection {
    pub name: String,
    pub fields: Vec<IntegrationField>,
}

/// One record as submitted to `save`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrationRecord {
    pub id: i64,
    pub object_type_id: i64,
    pub object_type_name: String,
    pub module: String,
    pub form_name: String,
    /// Action applied while saving (`triCreate` for new records, `triSave` otherwise).
    pub action: String,
    pub sections: Vec<IntegrationSection>,
}

/// Per-record outcome inside a store reply.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseHelper {
    pub record_id: i64,
    pub status: String,
    pub value: String,
}

/// Reply to save / trigger / associate calls. `successful` counts the records the store accepted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseHeader {
    pub successful: usize,
    pub helpers: Vec<ResponseHelper>,
}

impl ResponseHeader {
    pub fn accepted(record_id: i64) -> Self {
        ResponseHeader {
            successful: 1,
            helpers: vec![ResponseHelper {
                record_id,
                status: "200".into(),
                value: String::new(),
            }],
        }
    }

    pub fn rejected(record_id: i64, status: impl Into<String>, value: impl Into<String>) -> Self {
        ResponseHeader {
            successful: 0,
            helpers: vec![ResponseHelper {
                record_id,
                status: status.into(),
                value: value.into(),
            }],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Association {
    pub record_id: i64,
    pub associated_record_id: i64,
    pub association_name: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOperator {
    Equals,
    Contains,
    /// Prefix match; `starts` in filter strings.
    #[serde(rename = "starts")]
    StartsWith,
}

impl FilterOperator {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "equals" => Some(FilterOperator::Equals),
            "contains" => Some(FilterOperator::Contains),
            "starts" => Some(FilterOperator::StartsWith),
            _ => None,
        }
    }

    pub fn matches(self, candidate: &str, wanted: &str) -> bool {
        match self {
            FilterOperator::Equals => candidate == wanted,
            FilterOperator::Contains => candidate.contains(wanted),
            FilterOperator::StartsWith => candidate.starts_with(wanted),
        }
    }
}

/// String-typed filter on an internal field of a named query.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportFilter {
    pub section: String,
    pub field: String,
    pub operator: FilterOperator,
    pub value: String,
}

impl ReportFilter {
    pub fn equals(field: impl Into<String>, value: impl Into<String>) -> Self {
        ReportFilter {
            section: FILTER_SECTION.into(),
            field: field.into(),
            operator: FilterOperator::Equals,
            value: value.into(),
        }
    }

    /// Filter from a request value. `contains:roof`, `starts:Fix` and `equals:x` pick the
    /// operator; any other value, including one with an unknown prefix, is an equality match.
    pub fn from_request(field: impl Into<String>, raw: &str) -> Self {
        let (operator, value) = match raw.split_once(':') {
            Some((op, rest)) => match FilterOperator::parse(op) {
                Some(operator) => (operator, rest),
                None => (FilterOperator::Equals, raw),
            },
            None => (FilterOperator::Equals, raw),
        };
        ReportFilter {
            section: FILTER_SECTION.into(),
            field: field.into(),
            operator,
            value: value.into(),
        }
    }
}

/// Invocation of a store-side named query. `start` is 1-based.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedQuery {
    pub project: String,
    pub module: String,
    pub business_object: String,
    pub query_name: String,
    pub filters: Vec<ReportFilter>,
    pub start: usize,
    pub limit: usize,
}

/// Largest page asked of a named query; pagination happens after assembly.
pub const QUERY_FETCH_LIMIT: usize = (i32::MAX / 4) as usize;

impl NamedQuery {
    pub fn new(module: &str, business_object: &str, query_name: &str, filters: Vec<ReportFilter>) -> Self {
        NamedQuery {
            project: String::new(),
            module: module.into(),
            business_object: business_object.into(),
            query_name: query_name.into(),
            filters,
            start: 1,
            limit: QUERY_FETCH_LIMIT,
        }
    }
}

/// One named-query result row: column label to value, in column order, `_id` first.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRow {
    pub values: Vec<(String, String)>,
}

impl ReportRow {
    pub fn new(record_id: impl Into<String>) -> Self {
        ReportRow {
            values: vec![(ROW_ID_LABEL.to_string(), record_id.into())],
        }
    }

    pub fn with(mut self, label: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.push((label.into(), value.into()));
        self
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, v)| v.as_str())
    }

    /// Record id from `_id`, falling back to `fallback_label`. `None` when absent or not numeric.
    pub fn record_id(&self, fallback_label: &str) -> Option<i64> {
        self.get(ROW_ID_LABEL)
            .or_else(|| self.get(fallback_label))
            .and_then(|s| s.trim().parse().ok())
    }
}
