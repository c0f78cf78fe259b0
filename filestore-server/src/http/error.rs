//! API error types with IntoResponse
//!
//! Each error class gets its own status so callers can tell bad input,
//! absence, backend failure and store outages apart.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::context::Interrupted;
use crate::db::StoreError;
use crate::models::ValidationError;
use crate::service::ServiceError;

/// Non-standard "client closed request" status.
const CLIENT_CLOSED_REQUEST: u16 = 499;

/// API error type with automatic HTTP status mapping
#[derive(Debug)]
pub enum ApiError {
    /// Validation failed (400)
    Validation(ValidationError),

    /// Resource not found (404)
    NotFound { resource: &'static str, id: String },

    /// Store rejected or failed the call (500)
    Backend(StoreError),

    /// Store unreachable (503)
    Unavailable { message: String },

    /// Caller went away while waiting (499)
    Cancelled,

    /// Request deadline passed (504)
    DeadlineExceeded,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Backend(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::Cancelled => StatusCode::from_u16(CLIENT_CLOSED_REQUEST)
                .unwrap_or(StatusCode::REQUEST_TIMEOUT),
            Self::DeadlineExceeded => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            Self::Validation(e) => json!({
                "error": "validation_error",
                "message": e.to_string()
            }),
            Self::NotFound { resource, id } => json!({
                "error": "not_found",
                "message": format!("{} '{}' not found", resource, id)
            }),
            // Already logged with the raw detail where it happened
            Self::Backend(_) => json!({
                "error": "backend_error",
                "message": "the storage backend failed to process the request"
            }),
            Self::Unavailable { .. } => json!({
                "error": "unavailable",
                "message": "storage backend is unavailable"
            }),
            Self::Cancelled => json!({
                "error": "cancelled",
                "message": "request was cancelled"
            }),
            Self::DeadlineExceeded => json!({
                "error": "timeout",
                "message": "request deadline exceeded"
            }),
        };

        (status, Json(body)).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Unavailable(message) => Self::Unavailable { message },
            other => Self::Backend(other),
        }
    }
}

impl From<Interrupted> for ApiError {
    fn from(e: Interrupted) -> Self {
        match e {
            Interrupted::Cancelled => Self::Cancelled,
            Interrupted::DeadlineExceeded => Self::DeadlineExceeded,
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Invalid(v) => v.into(),
            ServiceError::NotFound { id } => Self::NotFound {
                resource: "file",
                id,
            },
            ServiceError::Store(s) => s.into(),
            ServiceError::Interrupted(i) => i.into(),
        }
    }
}
