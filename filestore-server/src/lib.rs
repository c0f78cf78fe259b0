//! filestore-server: blob storage service with bounded admission
//!
//! Clients upload, download and list files over an HTTP/JSON surface.
//! Every operation passes through a per-class admission gate before it
//! reaches the PostgreSQL-backed repository.

pub mod admission;
pub mod config;
pub mod context;
pub mod db;
pub mod http;
pub mod models;
pub mod service;

pub use admission::{AdmissionController, AdmissionLimits, AdmissionPermit, OperationClass};
pub use config::AppConfig;
pub use context::{CallContext, Interrupted};
pub use db::{FileRepository, PgFileRepository, RepoResult, StoreError};
pub use models::{File, FileMetadata, FileTimestamps};
pub use service::{FileService, ServiceError};
