//! Store error classification
//!
//! Every sqlx failure is folded into a closed set of kinds here, once,
//! so callers branch on `StoreError` instead of inspecting driver types.

use std::fmt;

use sqlx::error::DatabaseError;
use sqlx::postgres::PgDatabaseError;

/// Structured failure reported by PostgreSQL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendDetail {
    /// SQLSTATE code (e.g. `23505`)
    pub code: String,
    pub message: String,
    pub detail: Option<String>,
    /// Server-side context (`WHERE` field of the error report)
    pub location: Option<String>,
    pub constraint: Option<String>,
}

impl BackendDetail {
    pub fn from_database_error(err: &dyn DatabaseError) -> Self {
        let (detail, location) = match err.try_downcast_ref::<PgDatabaseError>() {
            Some(pg) => (pg.detail().map(str::to_owned), pg.r#where().map(str::to_owned)),
            None => (None, None),
        };

        Self {
            code: err.code().map(|c| c.into_owned()).unwrap_or_default(),
            message: err.message().to_owned(),
            detail,
            location,
            constraint: err.constraint().map(str::to_owned),
        }
    }
}

impl fmt::Display for BackendDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SQL error {}: {}", self.code, self.message)?;
        if let Some(detail) = &self.detail {
            write!(f, ", detail: {}", detail)?;
        }
        if let Some(location) = &self.location {
            write!(f, ", where: {}", location)?;
        }
        Ok(())
    }
}

/// Closed set of store failure kinds.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The store cannot be reached (connect/IO/TLS failure, pool exhausted
    /// or closed).
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The store executed the statement and rejected it.
    #[error("{0}")]
    Backend(BackendDetail),

    /// Anything else (decode failures, protocol errors, ...).
    #[error("store error: {0}")]
    Generic(String),
}

impl StoreError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unavailable(_) => "unavailable",
            Self::Backend(_) => "backend",
            Self::Generic(_) => "generic",
        }
    }

    /// Log with the raw store detail. Returns `self` so it can sit in a
    /// `map_err` chain.
    pub fn logged(self, operation: &'static str) -> Self {
        match &self {
            Self::Backend(d) => tracing::error!(
                operation,
                code = %d.code,
                message = %d.message,
                detail = d.detail.as_deref().unwrap_or(""),
                location = d.location.as_deref().unwrap_or(""),
                constraint = d.constraint.as_deref().unwrap_or(""),
                "store rejected statement"
            ),
            Self::Unavailable(msg) => {
                tracing::error!(operation, error = %msg, "store unavailable")
            }
            Self::Generic(msg) => tracing::error!(operation, error = %msg, "store call failed"),
        }
        self
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db) => Self::Backend(BackendDetail::from_database_error(db.as_ref())),
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => Self::Unavailable(err.to_string()),
            other => Self::Generic(other.to_string()),
        }
    }
}
