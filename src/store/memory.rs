//! In-process record store: the demo server backend and the test double.

use crate::config::DEFAULT_ID_FIELD;
use crate::error::StoreError;
use crate::store::client::RecordStore;
use crate::store::types::{
    actions, Association, IntegrationRecord, NamedQuery, ReportRow, ResponseHeader,
};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

/// Where an injected failure fires.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum FailurePoint {
    Save,
    Action(String),
    Associate,
}

#[derive(Clone, Debug)]
pub enum InjectedFailure {
    /// Unsuccessful reply carrying `status` and `value`.
    Rejected { status: String, value: String },
    /// Transport fault raised by the client.
    Transport(String),
}

/// Most recent store calls kept by [`InMemoryStore::calls`]; older entries are dropped.
pub const CALL_LOG_CAPACITY: usize = 256;

#[derive(Clone, Debug)]
struct StoredRecord {
    object_type_id: i64,
    fields: Vec<(String, String)>,
}

impl StoredRecord {
    fn field(&self, id: i64, name: &str) -> Option<String> {
        if name == DEFAULT_ID_FIELD {
            return Some(id.to_string());
        }
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
    }

    fn merge(&mut self, fields: impl IntoIterator<Item = (String, String)>) {
        for (name, value) in fields {
            match self.fields.iter_mut().find(|(n, _)| *n == name) {
                Some(slot) => slot.1 = value,
                None => self.fields.push((name, value)),
            }
        }
    }
}

#[derive(Clone, Debug)]
struct RegisteredQuery {
    object_type_id: i64,
    /// (column label, internal field) in column order.
    columns: Vec<(String, String)>,
}

#[derive(Default)]
struct Inner {
    next_id: i64,
    next_type_id: i64,
    types: HashMap<(String, String), i64>,
    records: BTreeMap<i64, StoredRecord>,
    associations: Vec<Association>,
    queries: HashMap<String, RegisteredQuery>,
    failures: HashMap<FailurePoint, InjectedFailure>,
    calls: VecDeque<String>,
}

impl Inner {
    fn record_call(&mut self, call: String) {
        if self.calls.len() == CALL_LOG_CAPACITY {
            self.calls.pop_front();
        }
        self.calls.push_back(call);
    }
}

/// Thread-safe in-memory [`RecordStore`]. Locks are never held across an await.
pub struct InMemoryStore {
    inner: Mutex<Inner>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::with_next_id(1)
    }

    /// Start record ids at `next_id`.
    pub fn with_next_id(next_id: i64) -> Self {
        InMemoryStore {
            inner: Mutex::new(Inner {
                next_id,
                next_type_id: 10_000,
                ..Inner::default()
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register a module / business object pair; returns its type id. Idempotent.
    pub fn register_type(&self, module: &str, business_object: &str) -> i64 {
        let mut inner = self.lock();
        let key = (module.to_string(), business_object.to_string());
        if let Some(id) = inner.types.get(&key) {
            return *id;
        }
        inner.next_type_id += 1;
        let id = inner.next_type_id;
        inner.types.insert(key, id);
        id
    }

    /// Register a named query over one type; `columns` maps row labels to internal fields.
    pub fn register_query(&self, query_name: &str, module: &str, business_object: &str, columns: &[(&str, &str)]) {
        let object_type_id = self.register_type(module, business_object);
        let columns = columns
            .iter()
            .map(|(label, field)| (label.to_string(), field.to_string()))
            .collect();
        self.lock().queries.insert(
            query_name.to_string(),
            RegisteredQuery {
                object_type_id,
                columns,
            },
        );
    }

    /// Seed a record directly, bypassing save; returns its id.
    pub fn insert_record(&self, module: &str, business_object: &str, fields: &[(&str, &str)]) -> i64 {
        let object_type_id = self.register_type(module, business_object);
        let mut inner = self.lock();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.records.insert(
            id,
            StoredRecord {
                object_type_id,
                fields: fields.iter().map(|(n, v)| (n.to_string(), v.to_string())).collect(),
            },
        );
        id
    }

    pub fn link(&self, parent_id: i64, child_id: i64, association_name: &str) {
        self.lock().associations.push(Association {
            record_id: parent_id,
            associated_record_id: child_id,
            association_name: association_name.to_string(),
        });
    }

    /// Make the next call at `point` fail. Consumed by that call.
    pub fn inject_failure(&self, point: FailurePoint, failure: InjectedFailure) {
        self.lock().failures.insert(point, failure);
    }

    /// Stored field values of a record, in first-written order.
    pub fn record_fields(&self, id: i64) -> Option<Vec<(String, String)>> {
        self.lock().records.get(&id).map(|r| r.fields.clone())
    }

    pub fn associations(&self) -> Vec<Association> {
        self.lock().associations.clone()
    }

    /// Store calls in order, e.g. `save:triCreate`, `trigger:triSave`. Holds at most
    /// [`CALL_LOG_CAPACITY`] entries, the most recent ones.
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.iter().cloned().collect()
    }

    /// Consume an injected failure at `point`, rendering it as a reply or a transport error.
    fn take_failure(inner: &mut Inner, point: &FailurePoint, record_id: i64) -> Option<Result<ResponseHeader, StoreError>> {
        inner.failures.remove(point).map(|failure| match failure {
            InjectedFailure::Rejected { status, value } => Ok(ResponseHeader::rejected(record_id, status, value)),
            InjectedFailure::Transport(msg) => Err(StoreError::Transport(msg)),
        })
    }
}

fn not_found(record_id: i64) -> ResponseHeader {
    ResponseHeader::rejected(record_id, "404", format!("Record {} does not exist", record_id))
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn resolve_type(&self, module: &str, business_object: &str) -> Result<i64, StoreError> {
        self.lock()
            .types
            .get(&(module.to_string(), business_object.to_string()))
            .copied()
            .ok_or_else(|| StoreError::UnknownType {
                module: module.to_string(),
                business_object: business_object.to_string(),
            })
    }

    async fn save(&self, records: &[IntegrationRecord]) -> Result<ResponseHeader, StoreError> {
        let mut inner = self.lock();
        let mut reply = ResponseHeader::default();
        for record in records {
            inner.record_call(format!("save:{}", record.action));
            if let Some(injected) = Self::take_failure(&mut inner, &FailurePoint::Save, record.id) {
                return injected;
            }
            let fields = record
                .sections
                .iter()
                .flat_map(|s| s.fields.iter())
                .map(|f| (f.name.clone(), f.value.clone()));
            let id = if record.action == actions::CREATE && record.id < 0 {
                let id = inner.next_id;
                inner.next_id += 1;
                let mut stored = StoredRecord {
                    object_type_id: record.object_type_id,
                    fields: Vec::new(),
                };
                stored.merge(fields);
                inner.records.insert(id, stored);
                id
            } else if let Some(stored) = inner.records.get_mut(&record.id) {
                stored.merge(fields);
                record.id
            } else {
                return Ok(not_found(record.id));
            };
            let accepted = ResponseHeader::accepted(id);
            reply.successful += accepted.successful;
            reply.helpers.extend(accepted.helpers);
        }
        Ok(reply)
    }

    async fn trigger_action(&self, action: &str, record_id: i64) -> Result<ResponseHeader, StoreError> {
        let mut inner = self.lock();
        inner.record_call(format!("trigger:{}", action));
        if let Some(injected) = Self::take_failure(&mut inner, &FailurePoint::Action(action.to_string()), record_id) {
            return injected;
        }
        if !inner.records.contains_key(&record_id) {
            return Ok(not_found(record_id));
        }
        if action == actions::DELETE {
            inner.records.remove(&record_id);
            inner
                .associations
                .retain(|a| a.record_id != record_id && a.associated_record_id != record_id);
        }
        Ok(ResponseHeader::accepted(record_id))
    }

    async fn associate(&self, from_id: i64, to_id: i64, association_name: &str) -> Result<ResponseHeader, StoreError> {
        let mut inner = self.lock();
        inner.record_call(format!("associate:{}", association_name));
        if let Some(injected) = Self::take_failure(&mut inner, &FailurePoint::Associate, from_id) {
            return injected;
        }
        for id in [from_id, to_id] {
            if !inner.records.contains_key(&id) {
                return Ok(not_found(id));
            }
        }
        inner.associations.push(Association {
            record_id: from_id,
            associated_record_id: to_id,
            association_name: association_name.to_string(),
        });
        Ok(ResponseHeader::accepted(to_id))
    }

    async fn list_associated(
        &self,
        parent_id: i64,
        association_name: &str,
        limit: Option<usize>,
    ) -> Result<Vec<Association>, StoreError> {
        let mut inner = self.lock();
        inner.record_call(format!("associated:{}", association_name));
        let found = inner
            .associations
            .iter()
            .filter(|a| a.record_id == parent_id && a.association_name == association_name)
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect();
        Ok(found)
    }

    async fn run_named_query(&self, query: &NamedQuery) -> Result<Vec<ReportRow>, StoreError> {
        let mut inner = self.lock();
        inner.record_call(format!("query:{}", query.query_name));
        let registered = inner
            .queries
            .get(&query.query_name)
            .cloned()
            .ok_or_else(|| StoreError::QueryNotFound(query.query_name.clone()))?;
        let rows = inner
            .records
            .iter()
            .filter(|(_, r)| r.object_type_id == registered.object_type_id)
            .filter(|(id, r)| {
                query.filters.iter().all(|f| {
                    r.field(**id, &f.field)
                        .map(|v| f.operator.matches(&v, &f.value))
                        .unwrap_or(false)
                })
            })
            .skip(query.start.saturating_sub(1))
            .take(query.limit)
            .map(|(id, r)| {
                registered
                    .columns
                    .iter()
                    .fold(ReportRow::new(id.to_string()), |row, (label, field)| {
                        row.with(label.clone(), r.field(*id, field).unwrap_or_default())
                    })
            })
            .collect();
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::types::{IntegrationField, IntegrationSection, ReportFilter, NEW_RECORD_ID};

    fn new_record(object_type_id: i64, title: &str) -> IntegrationRecord {
        IntegrationRecord {
            id: NEW_RECORD_ID,
            object_type_id,
            object_type_name: "triWorkTask".into(),
            module: "triTask".into(),
            form_name: "triWorkTask".into(),
            action: actions::CREATE.into(),
            sections: vec![IntegrationSection {
                name: "General".into(),
                fields: vec![IntegrationField {
                    name: "triTitle".into(),
                    value: title.into(),
                }],
            }],
        }
    }

    #[tokio::test]
    async fn create_then_query() {
        let store = InMemoryStore::with_next_id(12345);
        store.register_query("Work Tasks", "triTask", "triWorkTask", &[("title", "triTitle")]);
        let type_id = store.resolve_type("triTask", "triWorkTask").await.unwrap();

        let reply = store.save(&[new_record(type_id, "Fix roof")]).await.unwrap();
        assert_eq!(reply, ResponseHeader::accepted(12345));

        let q = NamedQuery::new("triTask", "triWorkTask", "Work Tasks", vec![ReportFilter::equals("triTitle", "Fix roof")]);
        let rows = store.run_named_query(&q).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("_id"), Some("12345"));
        assert_eq!(rows[0].get("title"), Some("Fix roof"));
    }

    #[tokio::test]
    async fn id_field_filters_on_record_id() {
        let store = InMemoryStore::new();
        store.register_query("Q", "m", "bo", &[]);
        let a = store.insert_record("m", "bo", &[]);
        let _b = store.insert_record("m", "bo", &[]);
        let q = NamedQuery::new("m", "bo", "Q", vec![ReportFilter::equals(DEFAULT_ID_FIELD, a.to_string())]);
        let rows = store.run_named_query(&q).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].record_id(DEFAULT_ID_FIELD), Some(a));
    }

    #[tokio::test]
    async fn unknown_query_is_reported() {
        let store = InMemoryStore::new();
        let q = NamedQuery::new("m", "bo", "missing", Vec::new());
        assert_eq!(
            store.run_named_query(&q).await.unwrap_err(),
            StoreError::QueryNotFound("missing".into())
        );
    }

    #[tokio::test]
    async fn injected_failure_fires_once() {
        let store = InMemoryStore::new();
        let id = store.insert_record("m", "bo", &[]);
        store.inject_failure(
            FailurePoint::Action(actions::DELETE.into()),
            InjectedFailure::Rejected {
                status: "400".into(),
                value: "Cannot delete".into(),
            },
        );
        let first = store.trigger_action(actions::DELETE, id).await.unwrap();
        assert_eq!(first.successful, 0);
        let second = store.trigger_action(actions::DELETE, id).await.unwrap();
        assert_eq!(second.successful, 1);
        assert!(store.record_fields(id).is_none());
    }

    #[tokio::test]
    async fn call_log_keeps_only_recent_calls() {
        let store = InMemoryStore::new();
        let id = store.insert_record("m", "bo", &[]);
        for _ in 0..CALL_LOG_CAPACITY {
            store.trigger_action(actions::SAVE, id).await.unwrap();
        }
        store.associate(id, id, "Self").await.unwrap();
        let calls = store.calls();
        assert_eq!(calls.len(), CALL_LOG_CAPACITY);
        assert_eq!(calls.last().map(String::as_str), Some("associate:Self"));
        assert_eq!(calls[0], "trigger:triSave");
    }

    #[tokio::test]
    async fn delete_drops_associations() {
        let store = InMemoryStore::new();
        let parent = store.insert_record("m", "p", &[]);
        let child = store.insert_record("m", "c", &[]);
        store.link(parent, child, "Has Comment");
        store.trigger_action(actions::DELETE, child).await.unwrap();
        assert!(store.list_associated(parent, "Has Comment", None).await.unwrap().is_empty());
    }
}
