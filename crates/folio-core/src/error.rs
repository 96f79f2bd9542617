//! Error types for the core crate.

use folio_snapshot::{ContentKey, SnapshotError};
use folio_store::StoreError;
use thiserror::Error;

/// Core error types.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Configuration error.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// Store error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Snapshot error.
    #[error("snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Live entity record not found.
    #[error("content not found: {0}")]
    ContentNotFound(ContentKey),

    /// Operation needs an entity id, but the entity was never saved.
    #[error("content has not been saved yet")]
    NotSaved,

    /// A pending restore was prepared for a different entity.
    #[error("restore was prepared for {expected}, not {actual}")]
    RestoreMismatch {
        expected: ContentKey,
        actual: ContentKey,
    },
}

/// Configuration-specific errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid JSON/JSONC syntax.
    #[error("invalid config at {path}: {message}")]
    InvalidJson { path: String, message: String },

    /// Config validation failed.
    #[error("config validation failed: {message}")]
    Validation { message: String },

    /// Environment variable not found during substitution.
    #[error("environment variable not found: {name}")]
    EnvVarNotFound { name: String },
}

impl ConfigError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
