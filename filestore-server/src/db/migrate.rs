//! Raw SQL migration runner
//!
//! Reads a SQL file and executes its statements against the pool as one
//! multi-statement batch.

use std::path::{Path, PathBuf};

use sqlx::PgPool;

use super::StoreError;

/// Schema for the `files` table, as shipped in `migrations/`.
pub const FILES_SCHEMA: &str = include_str!("../../migrations/0001_create_files.sql");

#[derive(Debug, thiserror::Error)]
pub enum MigrateError {
    #[error("failed to read SQL file {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("SQL file {path:?} is empty")]
    Empty { path: PathBuf },

    #[error("failed to execute migration: {0}")]
    Store(#[from] StoreError),
}

/// Execute the SQL in `path`.
pub async fn apply_file(pool: &PgPool, path: &Path) -> Result<(), MigrateError> {
    let sql = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| MigrateError::Read {
            path: path.to_path_buf(),
            source,
        })?;

    if sql.trim().is_empty() {
        return Err(MigrateError::Empty {
            path: path.to_path_buf(),
        });
    }

    tracing::info!(path = %path.display(), "applying migration");
    apply_sql(pool, &sql).await?;
    tracing::info!(path = %path.display(), "migration applied successfully");
    Ok(())
}

/// Execute a batch of SQL statements.
pub async fn apply_sql(pool: &PgPool, sql: &str) -> Result<(), StoreError> {
    sqlx::raw_sql(sql)
        .execute(pool)
        .await
        .map_err(|e| StoreError::from(e).logged("migrate"))?;
    Ok(())
}
