//! Custom Axum extractors

use std::sync::Arc;
use std::time::Duration;

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::request::Parts;
use axum::Json;

use super::error::ApiError;
use super::server::AppState;
use crate::context::CallContext;
use crate::models::ValidationError;

/// Caller-supplied timeout in milliseconds.
pub const REQUEST_TIMEOUT_HEADER: &str = "x-request-timeout-ms";

/// Call context for the request: the server deadline, tightened by the
/// caller's `x-request-timeout-ms` header when present.
///
/// A client that disconnects drops the handler future, which drops any
/// pending admission wait along with it.
pub struct RequestContext(pub CallContext);

impl FromRequestParts<Arc<AppState>> for RequestContext {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let mut ctx = CallContext::new();

        if let Some(timeout) = state.request_timeout {
            ctx = ctx.with_timeout(timeout);
        }

        if let Some(value) = parts.headers.get(REQUEST_TIMEOUT_HEADER) {
            let millis: u64 = value
                .to_str()
                .ok()
                .and_then(|v| v.trim().parse().ok())
                .ok_or_else(|| {
                    ApiError::Validation(ValidationError::InvalidFormat {
                        field: REQUEST_TIMEOUT_HEADER,
                        reason: "expected a whole number of milliseconds".to_string(),
                    })
                })?;
            ctx = ctx.with_timeout(Duration::from_millis(millis));
        }

        Ok(Self(ctx))
    }
}

/// `Json<T>` whose rejections (bad syntax, missing fields, wrong content
/// type) come back as 400 validation errors in the usual error envelope.
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(|rejection| {
            ApiError::Validation(ValidationError::InvalidFormat {
                field: "body",
                reason: rejection.body_text(),
            })
        })?;
        Ok(Self(value))
    }
}
