//! Record bridge: configuration-driven REST adapter over a session-based legacy record store.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod handlers;
pub mod mapping;
pub mod query;
pub mod response;
pub mod router;
pub mod routes;
pub mod sanitize;
pub mod service;
pub mod state;
pub mod store;

pub use config::{load_from_path, load_from_str, resolve, ApiDefinition, ResolvedModel, ResolvedResource, Settings};
pub use error::{AppError, ConfigError, StoreError};
pub use mapping::FieldMapper;
pub use response::{error_body, success_created, success_ok};
pub use router::{PathRouter, Route, RouteContext};
pub use routes::{adapter_routes, adapter_routes_with_limit, common_routes_with_state};
pub use sanitize::sanitize;
pub use service::{CrudService, RetrievalService};
pub use state::AppState;
pub use store::{InMemoryStore, RecordStore, StoreGateway};
