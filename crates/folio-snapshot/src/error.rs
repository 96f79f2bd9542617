//! Snapshot error types.

use crate::ContentType;
use thiserror::Error;

/// Result type for snapshot operations.
pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// Errors that can occur while building or decoding snapshots.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Payload does not match the schema of its content type.
    #[error("Invalid {content_type} snapshot: {message}")]
    InvalidSnapshot {
        content_type: ContentType,
        message: String,
    },

    /// Snapshot belongs to a different content type than its partition.
    #[error("Content type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        expected: ContentType,
        actual: ContentType,
    },

    /// Content type discriminator is not known.
    #[error("Unknown content type: {0}")]
    UnknownContentType(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SnapshotError {
    /// Create an invalid snapshot error.
    pub fn invalid(content_type: ContentType, message: impl Into<String>) -> Self {
        Self::InvalidSnapshot {
            content_type,
            message: message.into(),
        }
    }
}
