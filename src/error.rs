//! Typed errors and HTTP mapping.

use crate::response::{error_response, ALLOWED_METHODS};
use crate::sanitize::sanitize;
use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing reference: {kind} '{id}'")]
    MissingReference { kind: &'static str, id: String },
    #[error("duplicate path segment: {0}")]
    DuplicatePathSegment(String),
    #[error("duplicate {kind} field name '{name}' in resource {resource}")]
    DuplicateField {
        resource: String,
        kind: &'static str,
        name: String,
    },
    #[error("reserved path segment: {0}")]
    ReservedPath(String),
    #[error("config load: {0}")]
    Load(String),
    #[error("validation: {0}")]
    Validation(String),
}

/// Transport-level faults raised by a store client (as opposed to rejected operations,
/// which come back as unsuccessful replies).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("named query does not exist: {0}")]
    QueryNotFound(String),
    #[error("unknown object type: {module}.{business_object}")]
    UnknownType {
        module: String,
        business_object: String,
    },
    #[error("{0}")]
    Transport(String),
}

impl StoreError {
    /// Caller-facing text; type and query names stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            StoreError::QueryNotFound(_) => "The report backing this resource is not available.".to_string(),
            StoreError::UnknownType { .. } => "The record type of this resource is not available.".to_string(),
            StoreError::Transport(msg) => sanitize(msg, None),
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    /// A store call answered with a failure; `raw` is the backend text before sanitizing.
    #[error("{operation} failed: {raw}")]
    Backend { operation: &'static str, raw: String },
    #[error("method not allowed: {0}")]
    MethodNotAllowed(String),
    #[error("payload too large: {0}")]
    PayloadTooLarge(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) | AppError::Backend { .. } => StatusCode::BAD_REQUEST,
            AppError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Config(_) | AppError::Store(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message safe to show to API callers.
    pub fn public_message(&self) -> String {
        match self {
            AppError::NotFound(what) => format!("Resource not found: {}", what),
            AppError::BadRequest(msg) => sanitize(msg, None),
            AppError::Backend { operation, raw } => sanitize(raw, Some(operation)),
            AppError::MethodNotAllowed(_) => format!(
                "The HTTP method is not allowed for this resource. Allowed methods: {}",
                ALLOWED_METHODS
            ),
            AppError::PayloadTooLarge(_) => "Request body is too large.".to_string(),
            AppError::Config(e) => sanitize(&e.to_string(), None),
            AppError::Store(e) => e.public_message(),
            AppError::Internal(msg) => sanitize(msg, None),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::warn!(error = %self, status = status.as_u16(), "request rejected");
        }
        let body = error_response(status, self.public_message());
        if let AppError::MethodNotAllowed(_) = self {
            return (status, [(header::ALLOW, ALLOWED_METHODS)], body).into_response();
        }
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_lookups_hide_internal_names() {
        let err = AppError::from(StoreError::UnknownType {
            module: "triTask".into(),
            business_object: "triWorkTask".into(),
        });
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.public_message(), "The record type of this resource is not available.");

        let err = AppError::from(StoreError::QueryNotFound("kvx - triTask - Work Task".into()));
        assert!(!err.public_message().contains("kvx"));
    }

    #[test]
    fn transport_text_is_sanitized() {
        let err = AppError::from(StoreError::Transport("com.vendor.net.SocketError: connection reset".into()));
        assert_eq!(err.public_message(), "Connection reset.");
    }

    #[test]
    fn oversized_body_is_413() {
        let err = AppError::PayloadTooLarge("length limit exceeded".into());
        assert_eq!(err.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(err.public_message(), "Request body is too large.");
    }
}
