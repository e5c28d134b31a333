//! Builds named-query filters and sort from request parameters.
//! Field names come from the mapper only; values are escaped when rendered.

use crate::mapping::FieldMapper;
use crate::query::params::{QueryParams, SortOrder};
use crate::store::{FilterOperator, ReportFilter};
use serde_json::{Map, Value};
use std::cmp::Ordering;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SortSpec {
    pub exposed: String,
    pub internal: String,
    pub order: SortOrder,
}

/// Translated query: filters on internal fields (ANDed), optional sort, page window.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryExpression {
    pub filters: Vec<ReportFilter>,
    pub sort: Option<SortSpec>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// Double embedded single quotes.
fn quoted(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

pub struct QueryBuilder;

impl QueryBuilder {
    /// Unmapped filter and sort names are dropped, never forwarded as raw internal fields.
    pub fn build(mapper: &FieldMapper, params: &QueryParams) -> QueryExpression {
        let mut filters = Vec::with_capacity(params.filters.len());
        for (exposed, value) in &params.filters {
            match mapper.internal_name(exposed) {
                Some(internal) => filters.push(ReportFilter::from_request(internal, value)),
                None => tracing::debug!(param = %exposed, "ignoring unmapped filter"),
            }
        }
        let sort = params.sort.as_deref().and_then(|exposed| {
            let spec = mapper.internal_name(exposed).map(|internal| SortSpec {
                exposed: exposed.to_string(),
                internal: internal.to_string(),
                order: params.order,
            });
            if spec.is_none() {
                tracing::debug!(param = %exposed, "ignoring unmapped sort");
            }
            spec
        });
        QueryExpression {
            filters,
            sort,
            limit: params.limit,
            offset: params.offset,
        }
    }
}

impl QueryExpression {
    /// Textual form, e.g. `triTitle = 'O''Brien' AND triStatusCL = 'Open' ORDER BY triTitle DESC`.
    pub fn render(&self) -> String {
        let mut out = self
            .filters
            .iter()
            .map(|f| match f.operator {
                FilterOperator::Equals => format!("{} = {}", f.field, quoted(&f.value)),
                FilterOperator::Contains => format!("{} LIKE {}", f.field, quoted(&format!("%{}%", f.value))),
                FilterOperator::StartsWith => format!("{} LIKE {}", f.field, quoted(&format!("{}%", f.value))),
            })
            .collect::<Vec<_>>()
            .join(" AND ");
        if let Some(sort) = &self.sort {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(&format!("ORDER BY {} {}", sort.internal, sort.order.as_sql()));
        }
        out
    }

    /// Whether an exposed record satisfies every filter. Used where the store cannot filter (nested listings).
    pub fn matches(&self, mapper: &FieldMapper, record: &Map<String, Value>) -> bool {
        self.filters.iter().all(|f| {
            let key = mapper.exposed_name(&f.field).unwrap_or(&f.field);
            record
                .get(key)
                .and_then(Value::as_str)
                .map(|v| f.operator.matches(v, &f.value))
                .unwrap_or(false)
        })
    }

    /// Stable sort of exposed records by string value; missing values sort first.
    pub fn sort_records(&self, records: &mut [Map<String, Value>]) {
        let Some(sort) = &self.sort else { return };
        records.sort_by(|a, b| {
            let ord = cmp_field(a.get(&sort.exposed), b.get(&sort.exposed));
            match sort.order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        });
    }
}

fn cmp_field(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let text = |v: Option<&Value>| v.and_then(Value::as_str).map(str::to_string);
    text(a).cmp(&text(b))
}

/// Window `[offset, min(offset + limit, len))` over assembled results; absent values mean unbounded.
pub fn paginate<T>(items: Vec<T>, limit: Option<usize>, offset: Option<usize>) -> Vec<T> {
    if limit.is_none() && offset.is_none() {
        return items;
    }
    let start = offset.unwrap_or(0);
    if start >= items.len() {
        return Vec::new();
    }
    let take = limit.unwrap_or(usize::MAX);
    items.into_iter().skip(start).take(take).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FieldConfig;
    use serde_json::json;
    use std::collections::HashMap;

    fn mapper() -> FieldMapper {
        let fields: Vec<FieldConfig> = serde_json::from_value(json!([
            { "name": "triTitle", "exposedName": "title" },
            { "name": "triStatusCL", "exposedName": "status" }
        ]))
        .unwrap();
        FieldMapper::new(&fields)
    }

    fn params(pairs: &[(&str, &str)]) -> QueryParams {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        QueryParams::from_map(&map)
    }

    #[test]
    fn filters_are_translated_and_escaped() {
        let q = QueryBuilder::build(&mapper(), &params(&[("title", "O'Brien"), ("status", "Open"), ("triSecretTX", "x")]));
        assert_eq!(q.filters.len(), 2);
        assert_eq!(q.render(), "triStatusCL = 'Open' AND triTitle = 'O''Brien'");
    }

    #[test]
    fn operator_prefixes_render_as_like() {
        let q = QueryBuilder::build(&mapper(), &params(&[("title", "contains:roof"), ("status", "starts:Op")]));
        assert_eq!(q.render(), "triStatusCL LIKE 'Op%' AND triTitle LIKE '%roof%'");
        let m = mapper();
        let row = json!({ "title": "Fix roof", "status": "Open" });
        assert!(q.matches(&m, row.as_object().unwrap()));
        let row = json!({ "title": "Fix roof", "status": "Reopened" });
        assert!(!q.matches(&m, row.as_object().unwrap()));
    }

    #[test]
    fn sort_defaults_ascending_and_ignores_unmapped() {
        let q = QueryBuilder::build(&mapper(), &params(&[("_sort", "title")]));
        assert_eq!(q.render(), "ORDER BY triTitle ASC");
        let q = QueryBuilder::build(&mapper(), &params(&[("_sort", "triTitle"), ("_order", "DESC")]));
        assert!(q.sort.is_none());
        assert_eq!(q.render(), "");
    }

    #[test]
    fn sorts_records_stably() {
        let q = QueryBuilder::build(&mapper(), &params(&[("_sort", "title"), ("_order", "desc")]));
        let mut rows: Vec<Map<String, Value>> = ["b", "a", "c", "b"]
            .iter()
            .enumerate()
            .map(|(i, t)| json!({ "title": t, "n": i.to_string() }).as_object().cloned().unwrap())
            .collect();
        q.sort_records(&mut rows);
        let order: Vec<&str> = rows.iter().map(|r| r["n"].as_str().unwrap()).collect();
        assert_eq!(order, vec!["2", "0", "3", "1"]);
    }

    #[test]
    fn in_memory_match_uses_exposed_names() {
        let m = mapper();
        let q = QueryBuilder::build(&m, &params(&[("status", "Open")]));
        let open = json!({ "status": "Open" });
        let closed = json!({ "status": "Closed" });
        assert!(q.matches(&m, open.as_object().unwrap()));
        assert!(!q.matches(&m, closed.as_object().unwrap()));
    }

    #[test]
    fn pagination_window_size() {
        for n in 0..6usize {
            for offset in 0..8usize {
                for limit in 0..8usize {
                    let items: Vec<usize> = (0..n).collect();
                    let page = paginate(items, Some(limit), Some(offset));
                    let expected = limit.min(n.saturating_sub(offset));
                    assert_eq!(page.len(), expected, "n={n} offset={offset} limit={limit}");
                    assert!(page.iter().copied().eq((offset..).take(expected)));
                }
            }
        }
    }

    #[test]
    fn pagination_without_bounds_returns_everything() {
        assert_eq!(paginate(vec![1, 2, 3], None, None), vec![1, 2, 3]);
        assert_eq!(paginate(vec![1, 2, 3], None, Some(1)), vec![2, 3]);
        assert_eq!(paginate(vec![1, 2, 3], Some(1), None), vec![1]);
    }
}
