//! File repository
//!
//! Owns the entity lifecycle: the store generates ids and timestamps,
//! callers never set them. Absence is reported as `None`, never as a
//! zero-valued file. Failures are logged with the raw store detail and
//! returned; nothing is retried here.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::db::StoreError;
use crate::models::{File, FileTimestamps};

pub type RepoResult<T> = Result<T, StoreError>;

/// Persistence contract for files.
#[async_trait]
pub trait FileRepository: Send + Sync {
    /// Insert `file`; on success its id and timestamps are filled in.
    async fn create(&self, file: &mut File) -> RepoResult<()>;

    /// Every stored file, oldest first.
    async fn find_all(&self) -> RepoResult<Vec<File>>;

    async fn find_one(&self, id: &str) -> RepoResult<Option<File>>;

    /// Replace name and payload of the row matching `file.id`.
    /// `None` when no row matched.
    async fn update(&self, file: &File) -> RepoResult<Option<FileTimestamps>>;

    /// Hard delete. Returns the removed ids (zero or one).
    async fn delete(&self, id: &str) -> RepoResult<Vec<String>>;
}

/// PostgreSQL-backed repository
#[derive(Debug, Clone)]
pub struct PgFileRepository {
    pool: PgPool,
}

impl PgFileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FileRepository for PgFileRepository {
    async fn create(&self, file: &mut File) -> RepoResult<()> {
        let (id, created_at, updated_at): (String, DateTime<Utc>, DateTime<Utc>) = sqlx::query_as(
            r#"
            INSERT INTO files (name, data)
            VALUES ($1, $2)
            RETURNING id, create_time, update_time
            "#,
        )
        .bind(&file.name)
        .bind(&file.data)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StoreError::from(e).logged("create"))?;

        file.id = id;
        file.created_at = created_at;
        file.updated_at = updated_at;

        tracing::debug!(id = %file.id, name = %file.name, bytes = file.data.len(), "inserted file");
        Ok(())
    }

    async fn find_all(&self) -> RepoResult<Vec<File>> {
        let files: Vec<File> = sqlx::query_as(
            r#"
            SELECT id, name, data, create_time, update_time
            FROM files
            ORDER BY create_time, id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::from(e).logged("find_all"))?;

        tracing::debug!(rows = files.len(), "listed files");
        Ok(files)
    }

    async fn find_one(&self, id: &str) -> RepoResult<Option<File>> {
        let file: Option<File> = sqlx::query_as(
            "SELECT id, name, data, create_time, update_time FROM files WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::from(e).logged("find_one"))?;

        tracing::debug!(id, found = file.is_some(), "looked up file");
        Ok(file)
    }

    async fn update(&self, file: &File) -> RepoResult<Option<FileTimestamps>> {
        let stamps: Option<FileTimestamps> = sqlx::query_as(
            r#"
            UPDATE files SET
                name = $1,
                data = $2,
                update_time = GREATEST(NOW(), create_time)
            WHERE id = $3
            RETURNING create_time, update_time
            "#,
        )
        .bind(&file.name)
        .bind(&file.data)
        .bind(&file.id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::from(e).logged("update"))?;

        tracing::debug!(id = %file.id, updated = stamps.is_some(), "updated file");
        Ok(stamps)
    }

    async fn delete(&self, id: &str) -> RepoResult<Vec<String>> {
        let ids: Vec<String> = sqlx::query_scalar("DELETE FROM files WHERE id = $1 RETURNING id")
            .bind(id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::from(e).logged("delete"))?;

        tracing::debug!(id, removed = ids.len(), "deleted file");
        Ok(ids)
    }
}
