//! Storage types

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

/// Longest file name (in bytes) accepted for storage
pub const MAX_FILE_NAME_BYTES: usize = 255;

/// How many `name-N.ext` candidates are tried under the rename policy
pub const MAX_RENAME_ATTEMPTS: u32 = 1000;

/// A file committed to shared storage
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredFile {
    /// Path relative to the storage root, as sent to the backend
    pub relative_path: String,

    #[serde(skip)]
    pub absolute_path: PathBuf,

    /// Name supplied by the client before sanitizing/renaming
    pub original_name: String,

    /// Size in bytes
    pub size: u64,

    /// Hex SHA-256 of the stored content
    pub sha256: String,
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Invalid file name: {0:?}")]
    InvalidFileName(String),

    #[error("Upload is empty")]
    Empty,

    #[error("File already exists: {0}")]
    Conflict(String),

    #[error("No free name left for {0}")]
    NameSpaceExhausted(String),

    #[error("Upload stream failed: {0}")]
    Stream(String),

    #[error("Storage write did not finish within {0:?}")]
    Timeout(Duration),

    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
}

impl StorageError {
    pub(crate) fn io(context: &'static str) -> impl FnOnce(std::io::Error) -> Self {
        move |source| StorageError::Io { context, source }
    }
}
