//! File service - admission, persistence and response shaping
//!
//! Each operation walks Pending -> Admitted -> Executing -> Completed:
//! validate input, take a slot of the operation's class, call the
//! repository under the caller's cancellation/deadline, shape the result.
//! The slot is a scoped permit and is released on every exit path.

use std::sync::Arc;

use crate::admission::{AdmissionController, OperationClass};
use crate::config::ServerSettings;
use crate::context::{CallContext, Interrupted};
use crate::db::{FileRepository, StoreError};
use crate::models::{File, FileId, FileMetadata, FileName, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    #[error("invalid input: {0}")]
    Invalid(#[from] ValidationError),

    #[error("file '{id}' not found")]
    NotFound { id: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Interrupted(#[from] Interrupted),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Request handler for upload, download and list.
#[derive(Clone)]
pub struct FileService {
    repo: Arc<dyn FileRepository>,
    admission: AdmissionController,
    max_upload_bytes: usize,
}

impl FileService {
    pub fn new(repo: Arc<dyn FileRepository>, settings: &ServerSettings) -> Self {
        Self::with_admission(repo, AdmissionController::default(), settings.max_upload_bytes)
    }

    pub fn with_admission(
        repo: Arc<dyn FileRepository>,
        admission: AdmissionController,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            repo,
            admission,
            max_upload_bytes,
        }
    }

    pub fn admission(&self) -> &AdmissionController {
        &self.admission
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }

    /// Store a new file and return its assigned id.
    pub async fn upload(&self, ctx: &CallContext, name: &str, data: Vec<u8>) -> ServiceResult<String> {
        let name = FileName::new(name)?;
        if data.len() > self.max_upload_bytes {
            return Err(ValidationError::PayloadTooLarge {
                size: data.len(),
                max: self.max_upload_bytes,
            }
            .into());
        }

        let _permit = self.admit(OperationClass::Create, ctx).await?;
        tracing::debug!(name = %name.as_str(), "upload started");

        let mut file = File::new(name, data);
        let result = flatten(ctx.run(self.repo.create(&mut file)).await);

        match result {
            Ok(()) => {
                tracing::debug!(id = %file.id, "upload finished");
                tracing::info!(id = %file.id, name = %file.name, "file uploaded");
                Ok(file.id)
            }
            Err(e) => {
                tracing::error!(name = %file.name, error = %e, "failed to create file");
                Err(e)
            }
        }
    }

    /// Fetch a file with its payload.
    pub async fn download(&self, ctx: &CallContext, id: &str) -> ServiceResult<File> {
        let id = FileId::new(id)?;

        let _permit = self.admit(OperationClass::Read, ctx).await?;
        tracing::debug!(id = %id, "download started");

        match flatten(ctx.run(self.repo.find_one(id.as_str())).await) {
            Ok(Some(file)) => {
                tracing::debug!(id = %id, bytes = file.data.len(), "download finished");
                Ok(file)
            }
            Ok(None) => {
                tracing::debug!(id = %id, "file not found");
                Err(ServiceError::NotFound { id: id.to_string() })
            }
            Err(e) => {
                tracing::error!(id = %id, error = %e, "failed to find file");
                Err(e)
            }
        }
    }

    /// Metadata of every stored file. Payloads are not returned.
    pub async fn list(&self, ctx: &CallContext) -> ServiceResult<Vec<FileMetadata>> {
        let _permit = self.admit(OperationClass::List, ctx).await?;
        tracing::debug!("list started");

        match flatten(ctx.run(self.repo.find_all()).await) {
            Ok(files) => {
                tracing::debug!(count = files.len(), "list finished");
                Ok(files.into_iter().map(FileMetadata::from).collect())
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to find all files");
                Err(e)
            }
        }
    }

    async fn admit(
        &self,
        class: OperationClass,
        ctx: &CallContext,
    ) -> ServiceResult<crate::admission::AdmissionPermit> {
        self.admission.acquire(class, ctx).await.map_err(|e| {
            tracing::warn!(class = %class, reason = %e, "gave up waiting for admission");
            ServiceError::from(e)
        })
    }
}

fn flatten<T>(result: Result<Result<T, StoreError>, Interrupted>) -> ServiceResult<T> {
    match result {
        Ok(inner) => inner.map_err(ServiceError::from),
        Err(interrupted) => Err(interrupted.into()),
    }
}
