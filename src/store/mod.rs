//! Remote record store: client trait, wire types, reply gateway, in-memory backend.

mod client;
mod gateway;
mod memory;
pub mod types;

pub use client::RecordStore;
pub use gateway::{parse_record_id, BackendFailure, StoreCall, StoreGateway, ERROR_SENTINEL};
pub use memory::{FailurePoint, InMemoryStore, InjectedFailure, CALL_LOG_CAPACITY};
pub use types::*;
