//! Adapter router: every path falls through to the dispatcher so arbitrary
//! context prefixes reach the path router untouched.

use crate::dispatch::dispatch;
use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    response::{IntoResponse, Response},
    Router,
};
use std::any::Any;
use tower::ServiceBuilder;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

/// Default request body limit in bytes. Larger bodies get a 413 error envelope from the dispatcher.
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| err.downcast_ref::<&str>().map(|s| s.to_string()))
        .unwrap_or_else(|| "unknown panic payload".into());
    tracing::error!(panic = %detail, "handler panicked");
    AppError::Internal("An unexpected error occurred".into()).into_response()
}

pub fn adapter_routes(state: AppState) -> Router {
    adapter_routes_with_limit(state, DEFAULT_BODY_LIMIT)
}

pub fn adapter_routes_with_limit(state: AppState, body_limit: usize) -> Router {
    Router::new()
        .fallback(dispatch)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CatchPanicLayer::custom(panic_response))
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(state)
}
