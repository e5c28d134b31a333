//! Standard response envelope helpers.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Verbs the dispatcher serves; sent in the `Allow` header of 405 responses.
pub const ALLOWED_METHODS: &str = "GET, POST, PUT, DELETE";

#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessBody<T> {
    pub success: bool,
    pub data: T,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub httprc: u16,
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    #[serde(rename = "type")]
    pub type_: String,
    pub status: String,
    pub message: String,
    pub href: String,
}

pub fn success_ok<T: Serialize>(data: T) -> (StatusCode, Json<SuccessBody<T>>) {
    (StatusCode::OK, Json(SuccessBody { success: true, data }))
}

/// 201 with a `Location` header pointing at the new record.
pub fn success_created<T: Serialize>(data: T, location: String) -> Response {
    (
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(SuccessBody { success: true, data }),
    )
        .into_response()
}

/// Location of a record: base path, resource path and id joined with single slashes.
pub fn location(base_path: &str, resource_path: &str, id: &str) -> String {
    format!(
        "{}/{}/{}",
        base_path.trim_end_matches('/'),
        resource_path.trim_matches('/'),
        id
    )
}

fn status_labels(status: StatusCode) -> (&'static str, &'static str) {
    match status {
        StatusCode::BAD_REQUEST => ("BAD_REQUEST", "Client Error"),
        StatusCode::UNAUTHORIZED => ("UNAUTHORIZED", "Client Error"),
        StatusCode::FORBIDDEN => ("FORBIDDEN", "Client Error"),
        StatusCode::NOT_FOUND => ("NOT_FOUND", "Client Error"),
        StatusCode::METHOD_NOT_ALLOWED => ("METHOD_NOT_ALLOWED", "Client Error"),
        StatusCode::PAYLOAD_TOO_LARGE => ("PAYLOAD_TOO_LARGE", "Client Error"),
        s if s.is_client_error() => ("CLIENT_ERROR", "Client Error"),
        _ => ("INTERNAL_ERROR", "Server Error"),
    }
}

pub fn error_body(status: StatusCode, message: String) -> ErrorBody {
    let (label, kind) = status_labels(status);
    ErrorBody {
        httprc: status.as_u16(),
        error: ErrorDetail {
            code: status.as_u16().to_string(),
            type_: kind.to_string(),
            status: label.to_string(),
            message,
            href: String::new(),
        },
    }
}

pub fn error_response(status: StatusCode, message: String) -> Json<ErrorBody> {
    Json(error_body(status, message))
}
