//! Shared application state. Routing and mapping tables are built once and read-only afterwards;
//! the store handle is bound to a handler per request.

use crate::config::ResolvedModel;
use crate::router::PathRouter;
use crate::store::RecordStore;
use serde_json::Value;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub model: Arc<ResolvedModel>,
    pub router: Arc<PathRouter>,
    pub store: Arc<dyn RecordStore>,
    /// Served at `.../openapi.json` when present.
    pub openapi: Option<Arc<Value>>,
}

impl AppState {
    pub fn new(model: ResolvedModel, store: Arc<dyn RecordStore>) -> Self {
        let router = PathRouter::new(&model);
        AppState {
            model: Arc::new(model),
            router: Arc::new(router),
            store,
            openapi: None,
        }
    }

    pub fn with_openapi(mut self, document: Value) -> Self {
        self.openapi = Some(Arc::new(document));
        self
    }
}
