//! File endpoints
//!
//! - `POST /files`       upload, returns the assigned id
//! - `GET  /files/{id}`  download with payload
//! - `GET  /files`       metadata listing, no payloads
//!
//! Payloads travel as standard base64; timestamps as epoch seconds.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use crate::http::error::ApiError;
use crate::http::extractors::{RequestContext, ValidJson};
use crate::http::server::AppState;
use crate::models::{File, FileMetadata, ValidationError};

/// Upload request
#[derive(Debug, Deserialize, Serialize)]
pub struct UploadFileRequest {
    pub name: String,
    /// base64-encoded payload
    pub data: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct UploadFileResponse {
    pub id: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct DownloadFileResponse {
    pub name: String,
    /// base64-encoded payload
    pub data: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<File> for DownloadFileResponse {
    fn from(f: File) -> Self {
        Self {
            data: STANDARD.encode(&f.data),
            name: f.name,
            created_at: f.created_at.timestamp(),
            updated_at: f.updated_at.timestamp(),
        }
    }
}

/// Listing entry. Deliberately has no `data` field.
#[derive(Debug, Deserialize, Serialize)]
pub struct FileMetadataResponse {
    pub name: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<FileMetadata> for FileMetadataResponse {
    fn from(m: FileMetadata) -> Self {
        Self {
            name: m.name,
            created_at: m.created_at.timestamp(),
            updated_at: m.updated_at.timestamp(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ListFilesResponse {
    pub files: Vec<FileMetadataResponse>,
}

/// POST /files - store a new file
async fn upload_file(
    State(state): State<Arc<AppState>>,
    RequestContext(ctx): RequestContext,
    ValidJson(req): ValidJson<UploadFileRequest>,
) -> Result<(StatusCode, Json<UploadFileResponse>), ApiError> {
    let data = STANDARD.decode(req.data.as_bytes()).map_err(|e| {
        ValidationError::InvalidFormat {
            field: "data",
            reason: format!("invalid base64: {}", e),
        }
    })?;

    let id = state.service.upload(&ctx, &req.name, data).await?;

    Ok((StatusCode::CREATED, Json(UploadFileResponse { id })))
}

/// GET /files/{id} - fetch a file with its payload
async fn download_file(
    State(state): State<Arc<AppState>>,
    RequestContext(ctx): RequestContext,
    Path(id): Path<String>,
) -> Result<Json<DownloadFileResponse>, ApiError> {
    let file = state.service.download(&ctx, &id).await?;
    Ok(Json(DownloadFileResponse::from(file)))
}

/// GET /files - list metadata of all files
async fn list_files(
    State(state): State<Arc<AppState>>,
    RequestContext(ctx): RequestContext,
) -> Result<Json<ListFilesResponse>, ApiError> {
    let files = state.service.list(&ctx).await?;

    Ok(Json(ListFilesResponse {
        files: files.into_iter().map(FileMetadataResponse::from).collect(),
    }))
}

/// File routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/files", get(list_files).post(upload_file))
        .route("/files/{id}", get(download_file))
}
