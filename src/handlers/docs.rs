//! Documentation markers: `openapi.json` and `doc`.

use crate::error::AppError;
use crate::state::AppState;
use axum::response::{Html, IntoResponse, Response};
use axum::Json;

pub fn openapi(state: &AppState) -> Result<Response, AppError> {
    match &state.openapi {
        Some(doc) => Ok(Json(doc.as_ref().clone()).into_response()),
        None => Err(AppError::NotFound("openapi.json".into())),
    }
}

/// Minimal page pointing at the sibling `openapi.json` of `request_path`.
pub fn doc_page(state: &AppState, request_path: &str) -> Response {
    let trimmed = request_path.trim_end_matches('/');
    let dir = trimmed.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("");
    let spec_url = format!("{}/openapi.json", dir);
    let title = html_escape(&state.model.api_pack);
    Html(format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>{title} API</title></head>\n\
         <body>\n<h1>{title} API</h1>\n<p>OpenAPI document: <a href=\"{url}\">{url}</a></p>\n</body>\n</html>\n",
        title = title,
        url = html_escape(&spec_url),
    ))
    .into_response()
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
