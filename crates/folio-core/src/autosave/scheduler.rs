//! Auto-save decision logic.

use super::AutoSaveStatus;
use crate::config::AutoSaveConfig;
use folio_snapshot::ContentSnapshot;
use std::time::Duration;
use tokio::time::Instant;

/// Identifies one issued save so its outcome can be matched back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveTicket {
    revision: u64,
    generation: u64,
}

/// A save the caller should perform now.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveRequest {
    pub ticket: SaveTicket,
    pub snapshot: ContentSnapshot,
}

#[derive(Debug, Clone)]
struct Pending {
    revision: u64,
    snapshot: ContentSnapshot,
    changed_at: Instant,
}

/// Decides when the latest edit should be persisted.
///
/// A save becomes due once both gates are open:
/// - debounce: `debounce` has passed since the most recent edit
/// - interval: `interval` has passed since the last successful save
///
/// Only the newest snapshot is kept; older ones are superseded, never queued.
/// While a save is in flight nothing else is issued.
#[derive(Debug)]
pub struct Scheduler {
    debounce: Duration,
    interval: Duration,
    enabled: bool,
    online: bool,
    pending: Option<Pending>,
    in_flight: Option<(SaveTicket, ContentSnapshot)>,
    /// Content of the last successful save, or of the entity as opened.
    baseline: Option<ContentSnapshot>,
    last_saved_at: Option<Instant>,
    retry_at: Option<Instant>,
    forced: bool,
    revision: u64,
    generation: u64,
    status: AutoSaveStatus,
    last_error: Option<String>,
}

impl Scheduler {
    pub fn new(config: &AutoSaveConfig) -> Self {
        Self {
            debounce: config.debounce(),
            interval: config.interval(),
            enabled: config.enabled,
            online: true,
            pending: None,
            in_flight: None,
            baseline: None,
            last_saved_at: None,
            retry_at: None,
            forced: false,
            revision: 0,
            generation: 0,
            status: AutoSaveStatus::Idle,
            last_error: None,
        }
    }

    /// Treat `snapshot` as already persisted, so identical edits are not saved.
    pub fn with_baseline(mut self, snapshot: ContentSnapshot) -> Self {
        self.baseline = Some(snapshot);
        self
    }

    pub fn status(&self) -> AutoSaveStatus {
        self.status
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn is_saving(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Record a form change. Restarts the debounce window.
    pub fn update(&mut self, now: Instant, snapshot: ContentSnapshot) {
        if !self.enabled {
            return;
        }
        self.revision += 1;
        self.retry_at = None;
        self.pending = Some(Pending {
            revision: self.revision,
            snapshot,
            changed_at: now,
        });
    }

    /// Record content persisted outside the scheduler, e.g. a manual version.
    ///
    /// A pending edit equal to it is dropped.
    pub fn set_baseline(&mut self, snapshot: ContentSnapshot) {
        if self
            .pending
            .as_ref()
            .is_some_and(|p| p.snapshot == snapshot)
        {
            self.pending = None;
        }
        self.baseline = Some(snapshot);
    }

    /// Disabling clears pending work; the result of an in-flight save is ignored.
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled == enabled {
            return;
        }
        self.enabled = enabled;
        if !enabled {
            self.pending = None;
            self.retry_at = None;
            self.forced = false;
            self.generation += 1;
        }
    }

    pub fn set_online(&mut self, online: bool) {
        if self.online == online {
            return;
        }
        self.online = online;
        self.status = if online {
            self.resting_status()
        } else {
            AutoSaveStatus::Offline
        };
    }

    /// Make pending work due immediately, skipping both gates once.
    pub fn force(&mut self) {
        if self.pending.is_some() {
            self.forced = true;
            self.retry_at = None;
        }
    }

    /// Nothing left to do until the next edit.
    ///
    /// A failed attempt counts as settled; the retry waits for its tick.
    pub fn is_settled(&self) -> bool {
        if self.in_flight.is_some() {
            return false;
        }
        self.pending.is_none()
            || !self.enabled
            || !self.online
            || (self.status == AutoSaveStatus::Error && !self.forced)
    }

    /// The instant at which pending work becomes due, if any.
    pub fn ready_at(&self) -> Option<Instant> {
        if !self.enabled || !self.online || self.in_flight.is_some() {
            return None;
        }
        let pending = self.pending.as_ref()?;
        if self.forced {
            return Some(pending.changed_at);
        }

        let mut due = pending.changed_at + self.debounce;
        if let Some(saved) = self.last_saved_at {
            due = due.max(saved + self.interval);
        }
        if let Some(retry) = self.retry_at {
            due = due.max(retry);
        }
        Some(due)
    }

    /// Issue a save if one is due at `now`.
    pub fn poll(&mut self, now: Instant) -> Option<SaveRequest> {
        if self.ready_at()? > now {
            return None;
        }
        let pending = self.pending.take()?;
        self.forced = false;

        if self.baseline.as_ref() == Some(&pending.snapshot) {
            return None;
        }

        let ticket = SaveTicket {
            revision: pending.revision,
            generation: self.generation,
        };
        self.in_flight = Some((ticket, pending.snapshot.clone()));
        self.status = AutoSaveStatus::Saving;
        Some(SaveRequest {
            ticket,
            snapshot: pending.snapshot,
        })
    }

    /// Record the outcome of an issued save.
    ///
    /// Returns `false` if the outcome was ignored because auto-save was
    /// disabled while the save was in flight.
    pub fn complete(
        &mut self,
        now: Instant,
        ticket: SaveTicket,
        result: Result<(), String>,
    ) -> bool {
        let Some((issued, snapshot)) = self.in_flight.take() else {
            return false;
        };
        if issued != ticket || ticket.generation != self.generation {
            if self.status == AutoSaveStatus::Saving {
                self.status = self.resting_status();
            }
            return false;
        }

        match result {
            Ok(()) => {
                self.last_saved_at = Some(now);
                self.baseline = Some(snapshot);
                self.last_error = None;
                self.retry_at = None;
                if self.online {
                    self.status = AutoSaveStatus::Saved;
                }
            }
            Err(message) => {
                // Keep the failed content unless a newer edit superseded it
                if self.pending.is_none() {
                    self.pending = Some(Pending {
                        revision: ticket.revision,
                        snapshot,
                        changed_at: now,
                    });
                }
                if self
                    .pending
                    .as_ref()
                    .is_some_and(|p| p.revision == ticket.revision)
                {
                    self.retry_at = Some(now + self.interval);
                }
                self.last_error = Some(message);
                if self.online {
                    self.status = AutoSaveStatus::Error;
                }
            }
        }
        true
    }

    /// Status to show when no save is running and the session is online.
    fn resting_status(&self) -> AutoSaveStatus {
        if self.last_error.is_some() {
            AutoSaveStatus::Error
        } else if self.last_saved_at.is_some() {
            AutoSaveStatus::Saved
        } else {
            AutoSaveStatus::Idle
        }
    }
}
