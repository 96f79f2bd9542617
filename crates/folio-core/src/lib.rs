//! Core editing workflow for folio.
//!
//! This crate ties the snapshot model and the stores together:
//! - Configuration loading
//! - Debounced auto-save with retention
//! - Editing sessions and the restore flow

pub mod autosave;
pub mod config;
pub mod editor;
pub mod error;

pub use autosave::{AutoSaveHandle, AutoSaveState, AutoSaveStatus, Scheduler};
pub use config::{AutoSaveConfig, Config, HistoryConfig, StorageConfig};
pub use editor::{EditorSession, PendingRestore, Stores};
pub use error::{ConfigError, CoreError, CoreResult};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
