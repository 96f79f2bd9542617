//! Debounced auto-save of an entity being edited.
//!
//! [`Scheduler`] decides *when* a save is due; it holds no timers and does no
//! I/O, so every decision can be tested against explicit instants.
//! [`AutoSaveHandle`] runs a scheduler on a tokio task, sleeps until the next
//! deadline and issues at most one `create_version` call at a time.

mod driver;
mod scheduler;

pub use driver::AutoSaveHandle;
pub use scheduler::{SaveRequest, SaveTicket, Scheduler};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Indicator shown next to the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AutoSaveStatus {
    /// Nothing saved yet in this session.
    #[default]
    Idle,
    Saving,
    Saved,
    /// The last attempt failed; the next eligible tick retries.
    Error,
    /// Saves are suspended until connectivity returns.
    Offline,
}

impl AutoSaveStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AutoSaveStatus::Idle => "idle",
            AutoSaveStatus::Saving => "saving",
            AutoSaveStatus::Saved => "saved",
            AutoSaveStatus::Error => "error",
            AutoSaveStatus::Offline => "offline",
        }
    }
}

impl std::fmt::Display for AutoSaveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Observable auto-save state, published on every change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AutoSaveState {
    pub status: AutoSaveStatus,
    /// Wall-clock time of the last successful auto-save.
    pub last_saved_at: Option<DateTime<Utc>>,
    /// Number assigned to the last successful auto-save.
    pub last_version: Option<u32>,
    pub last_error: Option<String>,
    /// Whether edits are waiting to be saved.
    pub has_pending: bool,
}
