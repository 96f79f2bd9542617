//! Tokio task that runs a [`Scheduler`] against a version store.

use super::{AutoSaveState, Scheduler};
use crate::autosave::SaveTicket;
use crate::config::AutoSaveConfig;
use chrono::Utc;
use folio_snapshot::{ContentKey, ContentSnapshot, ContentVersion, NewVersion};
use folio_store::{StoreResult, VersionStore};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

enum Command {
    Update(ContentSnapshot),
    Baseline(ContentSnapshot),
    SetEnabled(bool),
    SetOnline(bool),
    Flush(oneshot::Sender<()>),
    Shutdown,
}

type SaveTask = (SaveTicket, JoinHandle<StoreResult<ContentVersion>>);

struct SaveFailure {
    message: String,
    transient: bool,
}

enum Event {
    Command(Command),
    Tick,
    Saved(SaveTicket, Result<ContentVersion, SaveFailure>),
    Closed,
}

/// Handle to a running auto-saver for one entity.
///
/// Dropping the handle stops the task. A save already in flight still
/// completes, but its outcome is discarded.
pub struct AutoSaveHandle {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<AutoSaveState>,
    task: Option<JoinHandle<()>>,
}

impl AutoSaveHandle {
    /// Start auto-saving `key`.
    ///
    /// `baseline` is the content already persisted for the entity; edits
    /// equal to it are not saved.
    pub fn spawn(
        store: Arc<dyn VersionStore>,
        key: ContentKey,
        baseline: Option<ContentSnapshot>,
        config: AutoSaveConfig,
        author: impl Into<String>,
    ) -> Self {
        let mut scheduler = Scheduler::new(&config);
        if let Some(snapshot) = baseline {
            scheduler = scheduler.with_baseline(snapshot);
        }

        let (commands, rx) = mpsc::unbounded_channel();
        let (state_tx, state) = watch::channel(AutoSaveState::default());

        let worker = Worker {
            store,
            key,
            author: author.into(),
            max_auto_saves: config.max_auto_saves,
            scheduler,
            commands: rx,
            state: state_tx,
            in_flight: None,
            flush_waiters: Vec::new(),
            last_saved_at: None,
            last_version: None,
        };
        let task = tokio::spawn(worker.run());

        Self {
            commands,
            state,
            task: Some(task),
        }
    }

    /// Report the current form content.
    pub fn update(&self, snapshot: ContentSnapshot) {
        self.send(Command::Update(snapshot));
    }

    /// Report content that was persisted by other means.
    pub fn set_baseline(&self, snapshot: ContentSnapshot) {
        self.send(Command::Baseline(snapshot));
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.send(Command::SetEnabled(enabled));
    }

    pub fn set_online(&self, online: bool) {
        self.send(Command::SetOnline(online));
    }

    /// Save pending edits now, ignoring both gates, and wait for the outcome.
    pub async fn flush(&self) {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Flush(tx));
        let _ = rx.await;
    }

    /// Current state.
    pub fn state(&self) -> AutoSaveState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<AutoSaveState> {
        self.state.clone()
    }

    /// Stop the task and wait for it to exit.
    pub async fn shutdown(mut self) {
        self.send(Command::Shutdown);
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }

    fn send(&self, command: Command) {
        // Fails only once the task has exited
        let _ = self.commands.send(command);
    }
}

impl Drop for AutoSaveHandle {
    fn drop(&mut self) {
        if self.task.is_some() {
            self.send(Command::Shutdown);
        }
    }
}

struct Worker {
    store: Arc<dyn VersionStore>,
    key: ContentKey,
    author: String,
    max_auto_saves: usize,
    scheduler: Scheduler,
    commands: mpsc::UnboundedReceiver<Command>,
    state: watch::Sender<AutoSaveState>,
    in_flight: Option<SaveTask>,
    flush_waiters: Vec<oneshot::Sender<()>>,
    last_saved_at: Option<chrono::DateTime<Utc>>,
    last_version: Option<u32>,
}

impl Worker {
    async fn run(mut self) {
        debug!(key = %self.key, "Auto-saver started");

        loop {
            self.dispatch();
            self.publish();
            self.notify_flushed();

            let deadline = self.scheduler.ready_at();
            let event = tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => Event::Command(command),
                    None => Event::Closed,
                },
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    Event::Tick
                }
                (ticket, result) = join_save(&mut self.in_flight) => Event::Saved(ticket, result),
            };

            match event {
                Event::Command(Command::Update(snapshot)) => {
                    self.scheduler.update(Instant::now(), snapshot);
                }
                Event::Command(Command::Baseline(snapshot)) => {
                    self.scheduler.set_baseline(snapshot);
                }
                Event::Command(Command::SetEnabled(enabled)) => {
                    debug!(key = %self.key, enabled, "Auto-save toggled");
                    self.scheduler.set_enabled(enabled);
                }
                Event::Command(Command::SetOnline(online)) => {
                    self.scheduler.set_online(online);
                }
                Event::Command(Command::Flush(waiter)) => {
                    self.scheduler.force();
                    self.flush_waiters.push(waiter);
                }
                Event::Command(Command::Shutdown) | Event::Closed => break,
                Event::Tick => {}
                Event::Saved(ticket, result) => self.finish(ticket, result),
            }
        }

        // Waiters see their sender dropped
        self.flush_waiters.clear();
        debug!(key = %self.key, "Auto-saver stopped");
    }

    /// Issue a save if the scheduler says one is due.
    fn dispatch(&mut self) {
        if self.in_flight.is_some() {
            return;
        }
        let Some(request) = self.scheduler.poll(Instant::now()) else {
            return;
        };

        debug!(key = %self.key, "Auto-saving");
        let store = self.store.clone();
        let new_version = NewVersion::auto_save(self.key.clone(), request.snapshot, &self.author);
        let keep = self.max_auto_saves;

        let handle = tokio::spawn(async move {
            let key = new_version.key.clone();
            let version = store.create_version(new_version).await?;
            if let Err(e) = store.prune_auto_saves(&key, keep).await {
                warn!(key = %key, error = %e, "Failed to prune auto-saves");
            }
            Ok(version)
        });
        self.in_flight = Some((request.ticket, handle));
    }

    fn finish(&mut self, ticket: SaveTicket, result: Result<ContentVersion, SaveFailure>) {
        let outcome = result
            .as_ref()
            .map(|_| ())
            .map_err(|failure| failure.message.clone());
        let accepted = self.scheduler.complete(Instant::now(), ticket, outcome);

        match result {
            Ok(version) if accepted => {
                info!(
                    key = %self.key,
                    version = version.version_number,
                    "Auto-saved"
                );
                self.last_saved_at = Some(version.created_at);
                self.last_version = Some(version.version_number);
            }
            Ok(version) => {
                debug!(
                    key = %self.key,
                    version = version.version_number,
                    "Ignoring auto-save completed after disable"
                );
            }
            Err(failure) => {
                warn!(
                    key = %self.key,
                    error = %failure.message,
                    transient = failure.transient,
                    "Auto-save failed"
                );
            }
        }
    }

    fn publish(&self) {
        let next = AutoSaveState {
            status: self.scheduler.status(),
            last_saved_at: self.last_saved_at,
            last_version: self.last_version,
            last_error: self.scheduler.last_error().map(str::to_string),
            has_pending: self.scheduler.has_pending(),
        };
        self.state.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }

    fn notify_flushed(&mut self) {
        if self.flush_waiters.is_empty() || !self.scheduler.is_settled() {
            return;
        }
        for waiter in self.flush_waiters.drain(..) {
            let _ = waiter.send(());
        }
    }
}

/// Wait for the in-flight save, or forever if there is none.
async fn join_save(
    in_flight: &mut Option<SaveTask>,
) -> (SaveTicket, Result<ContentVersion, SaveFailure>) {
    let Some((ticket, handle)) = in_flight.as_mut() else {
        return std::future::pending().await;
    };
    let ticket = *ticket;
    let result = match handle.await {
        Ok(Ok(version)) => Ok(version),
        Ok(Err(e)) => Err(SaveFailure {
            transient: e.is_transient(),
            message: e.to_string(),
        }),
        Err(e) => Err(SaveFailure {
            message: format!("save task failed: {e}"),
            transient: false,
        }),
    };
    *in_flight = None;
    (ticket, result)
}
