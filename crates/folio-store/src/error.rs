//! Store error types.

use folio_snapshot::{ContentKey, SnapshotError};
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO error (permission denied, disk full, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Snapshot failed validation at the store boundary
    #[error("Invalid snapshot: {0}")]
    Snapshot(#[from] SnapshotError),

    /// Requested version does not exist in its partition
    #[error("Version {version_number} not found for {key}")]
    VersionNotFound {
        key: ContentKey,
        version_number: u32,
    },

    /// Key component would escape the storage directory
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Backend could not be reached; the operation may succeed later
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Lock was poisoned (another thread panicked while holding the lock)
    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),
}

impl StoreError {
    /// Create a version not found error.
    pub fn version_not_found(key: &ContentKey, version_number: u32) -> Self {
        Self::VersionNotFound {
            key: key.clone(),
            version_number,
        }
    }

    /// Create an invalid key error.
    pub fn invalid_key(message: impl Into<String>) -> Self {
        Self::InvalidKey(message.into())
    }

    /// Create an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    /// Whether retrying the same request later could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Unavailable(_))
    }
}
