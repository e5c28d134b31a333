//! Record retrieval through named reports and associations.

use crate::config::{ParentLink, ReportDescriptor, ResolvedModel, ResolvedResource};
use crate::error::{AppError, StoreError};
use crate::query::{paginate, QueryExpression};
use crate::store::{NamedQuery, RecordStore, ReportFilter, ReportRow, ROW_ID_LABEL};
use serde_json::{Map, Value};

/// A record keyed by exposed field names.
pub type ExposedRecord = Map<String, Value>;

pub struct RetrievalService;

impl RetrievalService {
    /// Single-row report lookup on the id field. Every column must map to a field.
    pub async fn find_by_id(
        store: &dyn RecordStore,
        model: &ResolvedModel,
        resource: &ResolvedResource,
        id: i64,
    ) -> Result<ExposedRecord, AppError> {
        let report = model.report_for(&resource.business_object).ok_or_else(|| {
            AppError::Internal(format!(
                "no report registered for business object {}",
                resource.business_object
            ))
        })?;
        let query = NamedQuery::new(
            &report.module,
            &report.business_object,
            &report.query_name,
            vec![ReportFilter::equals(report.id_field.as_str(), id.to_string())],
        );
        tracing::debug!(report = %report.name, query = %report.query_name, id, "find by id");
        let rows = store.run_named_query(&query).await?;
        let row = rows
            .into_iter()
            .find(|r| r.record_id(&report.id_field) == Some(id))
            .ok_or_else(|| AppError::NotFound(format!("{}/{}", resource.resource_path, id)))?;
        record_from_row(resource, report, &row, id, true)
    }

    /// All records, or the children of `parent` when given. Filters, sort and the page window
    /// from `query` are applied to the assembled list.
    pub async fn find_all(
        store: &dyn RecordStore,
        model: &ResolvedModel,
        resource: &ResolvedResource,
        query: &QueryExpression,
        parent: Option<(i64, &ParentLink)>,
    ) -> Result<Vec<ExposedRecord>, AppError> {
        let mut records = match parent {
            Some((parent_id, link)) => {
                let children = Self::find_children(store, model, resource, parent_id, link).await?;
                children
                    .into_iter()
                    .filter(|r| query.matches(&resource.mapper, r))
                    .collect()
            }
            None => Self::run_report(store, model, resource, query).await?,
        };
        query.sort_records(&mut records);
        Ok(paginate(records, query.limit, query.offset))
    }

    async fn find_children(
        store: &dyn RecordStore,
        model: &ResolvedModel,
        resource: &ResolvedResource,
        parent_id: i64,
        link: &ParentLink,
    ) -> Result<Vec<ExposedRecord>, AppError> {
        let associations = store
            .list_associated(parent_id, &link.association_name, None)
            .await?;
        tracing::debug!(
            parent_id,
            association = %link.association_name,
            count = associations.len(),
            "associated records"
        );
        let mut out = Vec::with_capacity(associations.len());
        for a in associations {
            match Self::find_by_id(store, model, resource, a.associated_record_id).await {
                Ok(record) => out.push(record),
                Err(AppError::NotFound(what)) => {
                    tracing::warn!(record = %what, "associated record not visible in report; skipping");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(out)
    }

    async fn run_report(
        store: &dyn RecordStore,
        model: &ResolvedModel,
        resource: &ResolvedResource,
        query: &QueryExpression,
    ) -> Result<Vec<ExposedRecord>, AppError> {
        let Some(report) = model.report_for(&resource.business_object) else {
            tracing::warn!(
                resource = %resource.resource_path,
                bo = %resource.business_object,
                "no report registered; returning empty list"
            );
            return Ok(Vec::new());
        };
        let named = NamedQuery::new(
            &report.module,
            &report.business_object,
            &report.query_name,
            query.filters.clone(),
        );
        tracing::debug!(report = %report.name, query = %report.query_name, filter = %query.render(), "find all");
        let rows = match store.run_named_query(&named).await {
            Ok(rows) => rows,
            Err(StoreError::QueryNotFound(name)) => {
                tracing::warn!(query = %name, "named query missing in store; returning empty list");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };
        let mut out = Vec::with_capacity(rows.len());
        for row in &rows {
            let Some(id) = row.record_id(&report.id_field) else {
                tracing::warn!(report = %report.name, "report row without a numeric id; skipping");
                continue;
            };
            out.push(record_from_row(resource, report, row, id, false)?);
        }
        Ok(out)
    }
}

/// Convert a report row (labels are exposed names) into an exposed record carrying the id field.
/// With `strict`, a label that maps to no field is an error; otherwise it passes through.
fn record_from_row(
    resource: &ResolvedResource,
    report: &ReportDescriptor,
    row: &ReportRow,
    id: i64,
    strict: bool,
) -> Result<ExposedRecord, AppError> {
    let mapper = &resource.mapper;
    let mut fields = Vec::with_capacity(row.values.len() + 1);
    for (label, value) in &row.values {
        if label == ROW_ID_LABEL || *label == report.id_field {
            continue;
        }
        match mapper.internal_name(label) {
            Some(internal) => fields.push((internal.to_string(), value.clone())),
            None if strict => {
                tracing::error!(report = %report.name, label = %label, "report column has no field mapping");
                return Err(AppError::Internal(format!(
                    "report column '{}' has no field mapping in resource {}",
                    label, resource.resource_path
                )));
            }
            None => fields.push((label.clone(), value.clone())),
        }
    }
    fields.push((resource.id_field_name.clone(), id.to_string()));
    Ok(mapper.to_exposed(fields))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{load_from_str, resolve};
    use crate::query::{QueryBuilder, QueryParams};
    use crate::store::InMemoryStore;
    use std::collections::HashMap;

    fn model() -> ResolvedModel {
        resolve(
            &load_from_str(
                r#"{
                "apiPack": "kvxapi",
                "resources": [
                  { "resourcePath": "worktasks", "module": "triTask", "businessObject": "triWorkTask", "formName": "f",
                    "report": { "queryName": "Work Tasks" },
                    "fields": [
                      { "name": "triRecordIdSY", "exposedName": "worktaskId", "readOnly": true },
                      { "name": "triTitle", "exposedName": "title" },
                      { "name": "triStatusCL", "exposedName": "status" }
                    ] },
                  { "resourcePath": "comments", "module": "triComment", "businessObject": "triComment", "formName": "f",
                    "report": { "queryName": "Comments" },
                    "parent": { "resource": "worktasks", "parentIdParam": "worktaskId", "associationName": "Has Comment" },
                    "fields": [ { "name": "triCommentTX", "exposedName": "text" } ] },
                  { "resourcePath": "assets", "module": "triAsset", "businessObject": "triAsset", "formName": "f" }
                ]
            }"#,
            )
            .unwrap(),
        )
        .unwrap()
    }

    fn store() -> InMemoryStore {
        let s = InMemoryStore::with_next_id(1);
        s.register_query("Work Tasks", "triTask", "triWorkTask", &[("title", "triTitle"), ("status", "triStatusCL")]);
        s.register_query("Comments", "triComment", "triComment", &[("text", "triCommentTX")]);
        s
    }

    fn expr(model: &ResolvedModel, path: &str, pairs: &[(&str, &str)]) -> QueryExpression {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        QueryBuilder::build(&model.resource(path).unwrap().mapper, &QueryParams::from_map(&map))
    }

    #[tokio::test]
    async fn find_by_id_maps_columns_and_sets_id() {
        let (m, s) = (model(), store());
        let id = s.insert_record("triTask", "triWorkTask", &[("triTitle", "Fix roof"), ("triStatusCL", "Open")]);
        let r = RetrievalService::find_by_id(&s, &m, m.resource("worktasks").unwrap(), id).await.unwrap();
        assert_eq!(r["title"], "Fix roof");
        assert_eq!(r["worktaskId"], id.to_string());
    }

    #[tokio::test]
    async fn find_by_id_missing_is_not_found() {
        let (m, s) = (model(), store());
        let err = RetrievalService::find_by_id(&s, &m, m.resource("worktasks").unwrap(), 42).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn unmapped_column_is_a_hard_error_for_single_reads() {
        let m = model();
        let s = InMemoryStore::new();
        s.register_query("Work Tasks", "triTask", "triWorkTask", &[("legacyLabel", "triTitle")]);
        let id = s.insert_record("triTask", "triWorkTask", &[("triTitle", "x")]);
        let wt = m.resource("worktasks").unwrap();
        let err = RetrievalService::find_by_id(&s, &m, wt, id).await.unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));

        let all = RetrievalService::find_all(&s, &m, wt, &QueryExpression::default(), None).await.unwrap();
        assert_eq!(all[0]["legacyLabel"], "x");
    }

    #[tokio::test]
    async fn find_all_filters_sorts_and_pages() {
        let (m, s) = (model(), store());
        for (t, st) in [("c", "Open"), ("a", "Open"), ("b", "Closed"), ("d", "Open")] {
            s.insert_record("triTask", "triWorkTask", &[("triTitle", t), ("triStatusCL", st)]);
        }
        let q = expr(&m, "worktasks", &[("status", "Open"), ("_sort", "title"), ("_limit", "2"), ("_offset", "1")]);
        let page = RetrievalService::find_all(&s, &m, m.resource("worktasks").unwrap(), &q, None).await.unwrap();
        let titles: Vec<&str> = page.iter().map(|r| r["title"].as_str().unwrap()).collect();
        assert_eq!(titles, vec!["c", "d"]);
    }

    #[tokio::test]
    async fn missing_report_degrades_to_empty() {
        let (m, s) = (model(), store());
        let assets = m.resource("assets").unwrap();
        assert!(RetrievalService::find_all(&s, &m, assets, &QueryExpression::default(), None).await.unwrap().is_empty());

        let bare = InMemoryStore::new();
        let wt = m.resource("worktasks").unwrap();
        assert!(RetrievalService::find_all(&bare, &m, wt, &QueryExpression::default(), None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn nested_listing_follows_associations() {
        let (m, s) = (model(), store());
        let parent = s.insert_record("triTask", "triWorkTask", &[("triTitle", "p")]);
        let c1 = s.insert_record("triComment", "triComment", &[("triCommentTX", "first")]);
        let c2 = s.insert_record("triComment", "triComment", &[("triCommentTX", "second")]);
        s.link(parent, c1, "Has Comment");
        s.link(parent, c2, "Has Comment");
        s.link(parent, 999, "Has Comment");

        let comments = m.resource("comments").unwrap();
        let link = comments.parent.clone().unwrap();
        let all = RetrievalService::find_all(&s, &m, comments, &QueryExpression::default(), Some((parent, &link)))
            .await
            .unwrap();
        assert_eq!(all.len(), 2);

        let q = expr(&m, "comments", &[("text", "second")]);
        let filtered = RetrievalService::find_all(&s, &m, comments, &q, Some((parent, &link))).await.unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0]["triRecordIdSY"], c2.to_string());

        let none = RetrievalService::find_all(&s, &m, comments, &QueryExpression::default(), Some((c1, &link)))
            .await
            .unwrap();
        assert!(none.is_empty());
    }
}
