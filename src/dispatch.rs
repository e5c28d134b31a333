//! Request dispatcher: method resolution, routing, and hand-off to the resource handler.

use crate::error::AppError;
use crate::handlers::{docs, ResourceHandler};
use crate::query::QueryParams;
use crate::router::Route;
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, Query, State},
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use std::collections::HashMap;

/// Header carrying the intended verb for clients that can only send GET/POST.
pub const METHOD_OVERRIDE_HEADER: &str = "x-http-method-override";

/// Verb to act on: the override header when present and valid, otherwise the request method.
pub fn effective_method(method: &Method, headers: &HeaderMap) -> Method {
    headers
        .get(METHOD_OVERRIDE_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_ascii_uppercase())
        .filter(|v| !v.is_empty())
        .and_then(|v| Method::from_bytes(v.as_bytes()).ok())
        .unwrap_or_else(|| method.clone())
}

/// Decoded query parameters; duplicates keep the last value, a malformed query yields none.
pub fn query_map(uri: &Uri) -> HashMap<String, String> {
    Query::<HashMap<String, String>>::try_from_uri(uri)
        .map(|Query(q)| q)
        .unwrap_or_default()
}

/// Fallback handler serving every adapter path.
pub async fn dispatch(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    uri: Uri,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    match handle(&state, &method, &headers, &uri, body).await {
        Ok(response) => response,
        Err(e) => e.into_response(),
    }
}

async fn handle(
    state: &AppState,
    method: &Method,
    headers: &HeaderMap,
    uri: &Uri,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, AppError> {
    let method = effective_method(method, headers);
    let path = uri.path();
    let route = state
        .router
        .resolve(path)
        .ok_or_else(|| AppError::NotFound(path.to_string()))?;
    tracing::debug!(method = %method, path = %path, "dispatch");

    let ctx = match route {
        Route::OpenApi if method == Method::GET => return docs::openapi(state),
        Route::Doc if method == Method::GET => return Ok(docs::doc_page(state, path)),
        Route::OpenApi | Route::Doc => return Err(AppError::MethodNotAllowed(method.to_string())),
        Route::Resource(ctx) => ctx,
    };
    let resource = state
        .model
        .resources
        .get(ctx.resource)
        .ok_or_else(|| AppError::Internal(format!("route points at unknown resource {}", ctx.resource)))?;
    let handler = ResourceHandler::new(&state.model, resource, state.store.as_ref());

    let read_body = |body: Result<Bytes, BytesRejection>| {
        body.map_err(|e| match e.status() {
            StatusCode::PAYLOAD_TOO_LARGE => AppError::PayloadTooLarge(e.body_text()),
            _ => AppError::BadRequest(format!("Request body could not be read: {}", e.body_text())),
        })
    };
    match method {
        Method::GET => handler.get(&ctx, &QueryParams::from_map(&query_map(uri))).await,
        Method::POST => handler.post(&ctx, &read_body(body)?).await,
        Method::PUT => handler.put(&ctx, &read_body(body)?).await,
        Method::DELETE => handler.delete(&ctx).await,
        other => Err(AppError::MethodNotAllowed(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn override_header_wins() {
        let mut headers = HeaderMap::new();
        headers.insert(METHOD_OVERRIDE_HEADER, HeaderValue::from_static("delete"));
        assert_eq!(effective_method(&Method::POST, &headers), Method::DELETE);
        assert_eq!(effective_method(&Method::POST, &HeaderMap::new()), Method::POST);
    }

    #[test]
    fn query_decoding_keeps_last_duplicate() {
        let uri: Uri = "/worktasks?status=Open&title=Fix%20roof&status=Closed".parse().unwrap();
        let q = query_map(&uri);
        assert_eq!(q.get("title").map(String::as_str), Some("Fix roof"));
        assert_eq!(q.get("status").map(String::as_str), Some("Closed"));
    }
}
