//! In-memory store implementations for testing.

use crate::{
    check_entity_type, EntityStore, ListOptions, StoreError, StoreResult, VersionPage,
    VersionStore,
};
use async_trait::async_trait;
use folio_snapshot::{ContentKey, ContentSnapshot, ContentType, ContentVersion, NewVersion};
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;
use tracing::{debug, info};

#[derive(Default)]
struct Partition {
    /// Highest number ever assigned in this partition.
    last_number: u32,
    versions: BTreeMap<u32, ContentVersion>,
}

/// In-memory version table.
///
/// This stores all data in memory and is not persistent.
#[derive(Default)]
pub struct MemoryVersionStore {
    partitions: RwLock<HashMap<ContentKey, Partition>>,
}

impl MemoryVersionStore {
    /// Create a new in-memory version store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> StoreError {
    StoreError::LockPoisoned(e.to_string())
}

#[async_trait]
impl VersionStore for MemoryVersionStore {
    async fn create_version(&self, request: NewVersion) -> StoreResult<ContentVersion> {
        request.validate()?;
        let key = request.key.clone();

        let mut partitions = self.partitions.write().map_err(poisoned)?;
        let partition = partitions.entry(key.clone()).or_default();
        partition.last_number += 1;

        let version = request.into_version(partition.last_number);
        partition
            .versions
            .insert(version.version_number, version.clone());

        info!(
            key = %key,
            version = version.version_number,
            auto_save = version.is_auto_save,
            "Created version"
        );
        Ok(version)
    }

    async fn list_versions(
        &self,
        key: &ContentKey,
        options: &ListOptions,
    ) -> StoreResult<VersionPage> {
        let partitions = self.partitions.read().map_err(poisoned)?;
        let newest_first: Vec<ContentVersion> = partitions
            .get(key)
            .map(|p| p.versions.values().rev().cloned().collect())
            .unwrap_or_default();
        Ok(VersionPage::paginate(newest_first, options))
    }

    async fn get_version(
        &self,
        key: &ContentKey,
        version_number: u32,
    ) -> StoreResult<Option<ContentVersion>> {
        let partitions = self.partitions.read().map_err(poisoned)?;
        Ok(partitions
            .get(key)
            .and_then(|p| p.versions.get(&version_number))
            .cloned())
    }

    async fn count_versions(&self, key: &ContentKey) -> StoreResult<u64> {
        let partitions = self.partitions.read().map_err(poisoned)?;
        Ok(partitions.get(key).map_or(0, |p| p.versions.len() as u64))
    }

    async fn prune_auto_saves(&self, key: &ContentKey, keep: usize) -> StoreResult<usize> {
        let mut partitions = self.partitions.write().map_err(poisoned)?;
        let Some(partition) = partitions.get_mut(key) else {
            return Ok(0);
        };

        // BTreeMap iterates oldest first
        let auto_saves: Vec<u32> = partition
            .versions
            .values()
            .filter(|v| v.is_auto_save)
            .map(|v| v.version_number)
            .collect();
        let excess = auto_saves.len().saturating_sub(keep);

        for number in &auto_saves[..excess] {
            partition.versions.remove(number);
        }

        if excess > 0 {
            debug!(key = %key, pruned = excess, "Pruned auto-save versions");
        }
        Ok(excess)
    }
}

/// In-memory live entity records.
#[derive(Default)]
pub struct MemoryEntityStore {
    entities: RwLock<HashMap<ContentKey, ContentSnapshot>>,
}

impl MemoryEntityStore {
    /// Create a new in-memory entity store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EntityStore for MemoryEntityStore {
    async fn load(&self, key: &ContentKey) -> StoreResult<Option<ContentSnapshot>> {
        let entities = self.entities.read().map_err(poisoned)?;
        Ok(entities.get(key).cloned())
    }

    async fn save(&self, key: &ContentKey, snapshot: &ContentSnapshot) -> StoreResult<()> {
        check_entity_type(key, snapshot)?;
        let mut entities = self.entities.write().map_err(poisoned)?;
        entities.insert(key.clone(), snapshot.clone());
        Ok(())
    }

    async fn list_ids(&self, content_type: ContentType) -> StoreResult<Vec<String>> {
        let entities = self.entities.read().map_err(poisoned)?;
        let mut ids: Vec<String> = entities
            .keys()
            .filter(|k| k.content_type == content_type)
            .map(|k| k.content_id.clone())
            .collect();
        ids.sort();
        Ok(ids)
    }
}
