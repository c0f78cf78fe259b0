//! File entity and its validated inputs

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use super::ValidationError;

/// Maximum length for file names (characters)
const MAX_FILE_NAME_LEN: usize = 255;

/// Maximum length for file ids
const MAX_FILE_ID_LEN: usize = 64;

/// A stored blob and its store-assigned identity and timestamps.
///
/// `id` stays empty until the repository has inserted the row.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct File {
    pub id: String,
    pub name: String,
    pub data: Vec<u8>,
    #[sqlx(rename = "create_time")]
    pub created_at: DateTime<Utc>,
    #[sqlx(rename = "update_time")]
    pub updated_at: DateTime<Utc>,
}

impl File {
    /// A not-yet-persisted file. Timestamps are placeholders until the
    /// store assigns them on insert.
    pub fn new(name: FileName, data: Vec<u8>) -> Self {
        Self {
            id: String::new(),
            name: name.into_string(),
            data,
            created_at: DateTime::<Utc>::UNIX_EPOCH,
            updated_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    pub fn is_persisted(&self) -> bool {
        !self.id.is_empty()
    }

    pub fn metadata(&self) -> FileMetadata {
        FileMetadata {
            name: self.name.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Listing projection. Carries no payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<File> for FileMetadata {
    fn from(f: File) -> Self {
        Self {
            name: f.name,
            created_at: f.created_at,
            updated_at: f.updated_at,
        }
    }
}

/// Timestamps returned by an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRow)]
pub struct FileTimestamps {
    #[sqlx(rename = "create_time")]
    pub created_at: DateTime<Utc>,
    #[sqlx(rename = "update_time")]
    pub updated_at: DateTime<Utc>,
}

/// Validated display name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileName(String);

impl FileName {
    /// Create a file name.
    ///
    /// # Rules
    /// - Surrounding whitespace is trimmed
    /// - Not empty after trimming
    /// - Max 255 characters
    ///
    /// # Example
    /// ```
    /// use filestore_server::models::FileName;
    ///
    /// assert!(FileName::new("a.jpg").is_ok());
    /// assert_eq!(FileName::new(" a.jpg\n").unwrap().as_str(), "a.jpg");
    /// assert!(FileName::new("   ").is_err());
    /// ```
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ValidationError::Empty { field: "file name" });
        }

        if s.chars().count() > MAX_FILE_NAME_LEN {
            return Err(ValidationError::TooLong {
                field: "file name",
                max: MAX_FILE_NAME_LEN,
            });
        }

        Ok(Self(s.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl AsRef<str> for FileName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Validated file identifier. Opaque: only emptiness and length are checked.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileId(String);

impl FileId {
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ValidationError::Empty { field: "file id" });
        }

        if s.len() > MAX_FILE_ID_LEN {
            return Err(ValidationError::TooLong {
                field: "file id",
                max: MAX_FILE_ID_LEN,
            });
        }

        Ok(Self(s.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for FileId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
