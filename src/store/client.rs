//! Client boundary to the remote record store.

use crate::error::StoreError;
use crate::store::types::{Association, IntegrationRecord, NamedQuery, ReportRow, ResponseHeader};
use async_trait::async_trait;

/// Operations the remote store offers. Rejections come back as unsuccessful
/// [`ResponseHeader`]s; `Err` is reserved for transport-level faults.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Numeric object type id for a module / business object pair.
    async fn resolve_type(&self, module: &str, business_object: &str) -> Result<i64, StoreError>;

    /// Create or update records; each record's `action` is applied while saving.
    async fn save(&self, records: &[IntegrationRecord]) -> Result<ResponseHeader, StoreError>;

    /// Run a workflow action (`triSave`, `triDelete`, ...) against one record.
    async fn trigger_action(&self, action: &str, record_id: i64) -> Result<ResponseHeader, StoreError>;

    async fn associate(
        &self,
        from_id: i64,
        to_id: i64,
        association_name: &str,
    ) -> Result<ResponseHeader, StoreError>;

    /// Records linked from `parent_id` under `association_name`.
    async fn list_associated(
        &self,
        parent_id: i64,
        association_name: &str,
        limit: Option<usize>,
    ) -> Result<Vec<Association>, StoreError>;

    /// Execute a named report. Fails with [`StoreError::QueryNotFound`] when the store has no such query.
    async fn run_named_query(&self, query: &NamedQuery) -> Result<Vec<ReportRow>, StoreError>;
}
