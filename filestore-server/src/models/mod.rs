//! Domain models with validation at construction
//!
//! Caller input is validated when creating the newtypes below.
//! Invalid input returns ValidationError, not panic.

pub mod file;
pub mod validation;

pub use file::{File, FileId, FileMetadata, FileName, FileTimestamps};
pub use validation::ValidationError;
