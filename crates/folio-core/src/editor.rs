//! Editing session for one entity.
//!
//! An [`EditorSession`] owns the live form, feeds every change to the
//! auto-saver and implements the restore flow. Restore is a two-step
//! operation: [`EditorSession::prepare_restore`] fetches the version and shows
//! what would change, [`EditorSession::confirm_restore`] applies it.

use crate::autosave::{AutoSaveHandle, AutoSaveState};
use crate::config::{AutoSaveConfig, Config};
use crate::error::{CoreError, CoreResult};
use folio_snapshot::{
    diff_fields, diff_versions, ContentKey, ContentSnapshot, ContentType, ContentVersion,
    NewVersion, SnapshotError, VersionChange, VersionDiff,
};
use folio_store::{EntityStore, ListOptions, StoreError, VersionPage, VersionStore};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info};

/// The stores a session reads from and writes to.
#[derive(Clone)]
pub struct Stores {
    pub versions: Arc<dyn VersionStore>,
    pub entities: Arc<dyn EntityStore>,
}

impl Stores {
    pub fn new(versions: Arc<dyn VersionStore>, entities: Arc<dyn EntityStore>) -> Self {
        Self { versions, entities }
    }
}

/// A restore awaiting confirmation.
///
/// Dropping it cancels the restore.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingRestore {
    pub key: ContentKey,
    pub version_number: u32,
    pub snapshot: ContentSnapshot,
    /// Changes from the current form to the restored content.
    pub changes: Vec<VersionChange>,
    /// Whether the form has edits that were never written to the live record.
    pub discards_unsaved_edits: bool,
}

/// Controller for one editing session.
pub struct EditorSession {
    stores: Stores,
    autosave_config: AutoSaveConfig,
    author: String,
    key: Option<ContentKey>,
    form: ContentSnapshot,
    dirty: bool,
    autosave: Option<AutoSaveHandle>,
}

impl EditorSession {
    /// Start editing an entity that does not exist yet.
    ///
    /// Auto-save stays off until the first [`save`](Self::save) assigns an id.
    pub fn new_entity(stores: Stores, content_type: ContentType, config: &Config) -> Self {
        Self {
            stores,
            autosave_config: config.autosave,
            author: config.author(),
            key: None,
            form: ContentSnapshot::empty(content_type),
            dirty: false,
            autosave: None,
        }
    }

    /// Open an existing entity and start auto-saving it.
    pub async fn open(stores: Stores, key: ContentKey, config: &Config) -> CoreResult<Self> {
        let form = stores
            .entities
            .load(&key)
            .await?
            .ok_or_else(|| CoreError::ContentNotFound(key.clone()))?;

        let mut session = Self {
            stores,
            autosave_config: config.autosave,
            author: config.author(),
            key: Some(key),
            form,
            dirty: false,
            autosave: None,
        };
        session.start_autosave();
        Ok(session)
    }

    pub fn key(&self) -> Option<&ContentKey> {
        self.key.as_ref()
    }

    pub fn content_type(&self) -> ContentType {
        self.form.content_type()
    }

    /// Current form content.
    pub fn form(&self) -> &ContentSnapshot {
        &self.form
    }

    /// Whether the form differs from what was last written to the live record.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Apply a user edit to the form.
    pub fn edit<F>(&mut self, apply: F) -> CoreResult<()>
    where
        F: FnOnce(&mut ContentSnapshot),
    {
        let mut next = self.form.clone();
        apply(&mut next);

        if next.content_type() != self.form.content_type() {
            return Err(SnapshotError::TypeMismatch {
                expected: self.form.content_type(),
                actual: next.content_type(),
            }
            .into());
        }
        if next == self.form {
            return Ok(());
        }

        self.form = next;
        self.dirty = true;
        if let Some(autosave) = &self.autosave {
            autosave.update(self.form.clone());
        }
        Ok(())
    }

    /// Write the form to the live record.
    ///
    /// The first save of a new entity assigns its id and enables auto-save.
    pub async fn save(&mut self) -> CoreResult<ContentKey> {
        let key = match &self.key {
            Some(key) => key.clone(),
            None => ContentKey::generate(self.form.content_type()),
        };

        self.stores.entities.save(&key, &self.form).await?;
        info!(key = %key, "Saved content");

        self.dirty = false;
        if self.key.is_none() {
            self.key = Some(key.clone());
            self.start_autosave();
        }
        Ok(key)
    }

    /// Record the form as a manual version.
    pub async fn save_version(&mut self, summary: Option<&str>) -> CoreResult<ContentVersion> {
        let key = self.require_key()?.clone();

        let mut request = NewVersion::manual(key, self.form.clone(), &self.author);
        if let Some(summary) = summary {
            request = request.with_summary(summary);
        }
        let version = self.stores.versions.create_version(request).await?;

        if let Some(autosave) = &self.autosave {
            autosave.set_baseline(self.form.clone());
        }
        Ok(version)
    }

    /// One page of this entity's history, newest first.
    ///
    /// A never-saved entity has an empty history.
    pub async fn history(&self, options: &ListOptions) -> CoreResult<VersionPage> {
        match &self.key {
            Some(key) => Ok(self.stores.versions.list_versions(key, options).await?),
            None => Ok(VersionPage::paginate(Vec::new(), options)),
        }
    }

    /// Field changes between two stored versions.
    pub async fn diff(&self, from: u32, to: u32) -> CoreResult<VersionDiff> {
        let from = self.fetch_version(from).await?;
        let to = self.fetch_version(to).await?;
        Ok(diff_versions(&from, &to))
    }

    /// Field changes from a stored version to the current form.
    pub async fn diff_with_current(&self, version_number: u32) -> CoreResult<Vec<VersionChange>> {
        let version = self.fetch_version(version_number).await?;
        Ok(diff_fields(&version.fields(), &self.form.fields()))
    }

    /// Fetch a version for restoring without touching the form.
    pub async fn prepare_restore(&self, version_number: u32) -> CoreResult<PendingRestore> {
        let key = self.require_key()?;
        let snapshot = self
            .stores
            .versions
            .restore_version(key, version_number)
            .await?;
        let changes = diff_fields(&self.form.fields(), &snapshot.fields());

        debug!(
            key = %key,
            version = version_number,
            changes = changes.len(),
            "Prepared restore"
        );
        Ok(PendingRestore {
            key: key.clone(),
            version_number,
            snapshot,
            changes,
            discards_unsaved_edits: self.dirty,
        })
    }

    /// Replace the form with a confirmed restore.
    ///
    /// Every field is overwritten. The form becomes dirty; no version is
    /// created and pending auto-save work from before the restore is dropped.
    pub fn confirm_restore(&mut self, pending: PendingRestore) -> CoreResult<()> {
        let key = self.require_key()?;
        if *key != pending.key {
            return Err(CoreError::RestoreMismatch {
                expected: pending.key,
                actual: key.clone(),
            });
        }

        info!(key = %key, version = pending.version_number, "Restored version");
        self.form = pending.snapshot;
        self.dirty = true;

        if let Some(autosave) = &self.autosave {
            autosave.set_enabled(false);
            autosave.set_enabled(self.autosave_config.enabled);
        }
        Ok(())
    }

    pub fn autosave_state(&self) -> AutoSaveState {
        self.autosave
            .as_ref()
            .map(AutoSaveHandle::state)
            .unwrap_or_default()
    }

    /// Receiver for auto-save state changes, once the entity has an id.
    pub fn subscribe_autosave(&self) -> Option<watch::Receiver<AutoSaveState>> {
        self.autosave.as_ref().map(AutoSaveHandle::subscribe)
    }

    pub fn set_autosave_enabled(&mut self, enabled: bool) {
        self.autosave_config.enabled = enabled;
        if let Some(autosave) = &self.autosave {
            autosave.set_enabled(enabled);
        }
    }

    pub fn set_online(&self, online: bool) {
        if let Some(autosave) = &self.autosave {
            autosave.set_online(online);
        }
    }

    /// Save pending auto-save work and stop the auto-saver.
    pub async fn close(self) {
        if let Some(autosave) = self.autosave {
            autosave.flush().await;
            autosave.shutdown().await;
        }
    }

    fn start_autosave(&mut self) {
        let Some(key) = self.key.clone() else {
            return;
        };
        self.autosave = Some(AutoSaveHandle::spawn(
            self.stores.versions.clone(),
            key,
            Some(self.form.clone()),
            self.autosave_config,
            self.author.clone(),
        ));
    }

    fn require_key(&self) -> CoreResult<&ContentKey> {
        self.key.as_ref().ok_or(CoreError::NotSaved)
    }

    async fn fetch_version(&self, version_number: u32) -> CoreResult<ContentVersion> {
        let key = self.require_key()?;
        let version = self
            .stores
            .versions
            .get_version(key, version_number)
            .await?
            .ok_or_else(|| StoreError::version_not_found(key, version_number))?;
        Ok(version)
    }
}
