//! Request query parameters split into reserved controls and filters.

use std::collections::HashMap;

pub const LIMIT: &str = "_limit";
pub const OFFSET: &str = "_offset";
pub const SORT: &str = "_sort";
pub const ORDER: &str = "_order";

pub const RESERVED: [&str; 4] = [LIMIT, OFFSET, SORT, ORDER];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// `DESC` (any case) is descending; anything else is ascending.
    pub fn parse(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("desc") {
            SortOrder::Desc
        } else {
            SortOrder::Asc
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryParams {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    /// Exposed field name to sort on.
    pub sort: Option<String>,
    pub order: SortOrder,
    /// Exposed name to wanted value, sorted by name.
    pub filters: Vec<(String, String)>,
}

impl QueryParams {
    /// Split decoded parameters. Unparseable `_limit` / `_offset` are ignored, negatives clamp to 0,
    /// and filters with an empty value are dropped.
    pub fn from_map(raw: &HashMap<String, String>) -> Self {
        let mut filters: Vec<(String, String)> = raw
            .iter()
            .filter(|(k, v)| !RESERVED.contains(&k.as_str()) && !k.is_empty() && !v.is_empty())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        filters.sort();
        QueryParams {
            limit: raw.get(LIMIT).and_then(|v| parse_count(v)),
            offset: raw.get(OFFSET).and_then(|v| parse_count(v)),
            sort: raw
                .get(SORT)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            order: raw.get(ORDER).map(|s| SortOrder::parse(s)).unwrap_or_default(),
            filters,
        }
    }
}

fn parse_count(v: &str) -> Option<usize> {
    let n: i64 = v.trim().parse().ok()?;
    Some(n.max(0) as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> QueryParams {
        let map = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        QueryParams::from_map(&map)
    }

    #[test]
    fn reserved_names_are_not_filters() {
        let p = params(&[("_limit", "10"), ("_offset", "5"), ("_sort", "title"), ("_order", "desc"), ("status", "Open")]);
        assert_eq!(p.limit, Some(10));
        assert_eq!(p.offset, Some(5));
        assert_eq!(p.sort.as_deref(), Some("title"));
        assert_eq!(p.order, SortOrder::Desc);
        assert_eq!(p.filters, vec![("status".to_string(), "Open".to_string())]);
    }

    #[test]
    fn invalid_numbers_are_ignored_and_negatives_clamp() {
        let p = params(&[("_limit", "ten"), ("_offset", "-3")]);
        assert_eq!(p.limit, None);
        assert_eq!(p.offset, Some(0));
    }

    #[test]
    fn order_defaults_to_ascending() {
        assert_eq!(params(&[]).order, SortOrder::Asc);
        assert_eq!(params(&[("_order", "sideways")]).order, SortOrder::Asc);
    }

    #[test]
    fn empty_values_are_dropped() {
        assert!(params(&[("status", "")]).filters.is_empty());
    }
}
