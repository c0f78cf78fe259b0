//! Repository implementations for database access

pub mod files;

pub use files::{FileRepository, PgFileRepository, RepoResult};
