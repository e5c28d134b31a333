//! Single point where raw store replies are inspected.
//!
//! Everything past this module sees `Result<i64, BackendFailure>`; the legacy
//! `bo_error: ...` text survives only inside [`BackendFailure::raw`] for sanitizing.

use crate::error::{AppError, StoreError};
use crate::store::client::RecordStore;
use crate::store::types::{IntegrationRecord, ResponseHeader};

/// Prefix the store client uses to mark a failure carried in a string result.
pub const ERROR_SENTINEL: &str = "bo_error: ";

/// Store call names as they appear in backend failure text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreCall {
    SaveRecord,
    TriggerSave,
    TriggerDelete,
    AssociateRecord,
}

impl StoreCall {
    pub fn as_str(self) -> &'static str {
        match self {
            StoreCall::SaveRecord => "saveRecord",
            StoreCall::TriggerSave => "triggerSave",
            StoreCall::TriggerDelete => "triggerDelete",
            StoreCall::AssociateRecord => "associateRecord",
        }
    }
}

/// A store call that did not succeed. `raw` is unsanitized.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackendFailure {
    pub call: StoreCall,
    pub raw: String,
}

impl BackendFailure {
    fn rejected(call: StoreCall, status: &str, value: &str) -> Self {
        BackendFailure {
            call,
            raw: format!("{}{} failed: {}:{}", ERROR_SENTINEL, call.as_str(), status, value),
        }
    }

    fn exception(call: StoreCall, err: &StoreError) -> Self {
        BackendFailure {
            call,
            raw: format!("{}exception:{}", ERROR_SENTINEL, err),
        }
    }

    /// Attach the user-facing operation (`Create`, `Update`, `Delete`).
    pub fn into_app_error(self, operation: &'static str) -> AppError {
        AppError::Backend {
            operation,
            raw: self.raw,
        }
    }
}

/// Parse a record id from text, refusing sentinel-marked failure strings.
pub fn parse_record_id(text: &str) -> Option<i64> {
    let text = text.trim();
    if text.starts_with(ERROR_SENTINEL.trim_end()) {
        return None;
    }
    text.parse().ok()
}

/// Wraps a borrowed store for the duration of one request.
pub struct StoreGateway<'a> {
    store: &'a dyn RecordStore,
}

impl<'a> StoreGateway<'a> {
    pub fn new(store: &'a dyn RecordStore) -> Self {
        StoreGateway { store }
    }

    pub fn store(&self) -> &'a dyn RecordStore {
        self.store
    }

    /// Save one record; returns the id the store assigned or kept.
    pub async fn save(&self, record: IntegrationRecord) -> Result<i64, BackendFailure> {
        let call = StoreCall::SaveRecord;
        tracing::debug!(
            call = call.as_str(),
            record_id = record.id,
            action = %record.action,
            sections = record.sections.len(),
            "store call"
        );
        let reply = self
            .store
            .save(std::slice::from_ref(&record))
            .await
            .map_err(|e| BackendFailure::exception(call, &e))?;
        check_reply(call, &reply)
    }

    pub async fn trigger(&self, call: StoreCall, action: &str, record_id: i64) -> Result<i64, BackendFailure> {
        tracing::debug!(call = call.as_str(), action = %action, record_id, "store call");
        let reply = self
            .store
            .trigger_action(action, record_id)
            .await
            .map_err(|e| BackendFailure::exception(call, &e))?;
        check_reply(call, &reply)
    }

    pub async fn associate(&self, from_id: i64, to_id: i64, association_name: &str) -> Result<(), BackendFailure> {
        let call = StoreCall::AssociateRecord;
        tracing::debug!(call = call.as_str(), from_id, to_id, association = %association_name, "store call");
        let reply = self
            .store
            .associate(from_id, to_id, association_name)
            .await
            .map_err(|e| BackendFailure::exception(call, &e))?;
        check_reply(call, &reply).map(|_| ())
    }
}

/// Success needs a positive count, a first helper, and a helper value that is not itself a failure marker.
fn check_reply(call: StoreCall, reply: &ResponseHeader) -> Result<i64, BackendFailure> {
    let Some(helper) = reply.helpers.first() else {
        return Err(BackendFailure::rejected(call, "", "no response"));
    };
    if reply.successful == 0 {
        return Err(BackendFailure::rejected(call, &helper.status, &helper.value));
    }
    if helper.value.trim_start().starts_with(ERROR_SENTINEL.trim_end()) {
        return Err(BackendFailure {
            call,
            raw: helper.value.clone(),
        });
    }
    Ok(helper.record_id)
}
