//! JSON file-based store implementations.
//!
//! Each version and each entity is stored as a separate JSON file:
//! ```text
//! root/
//!   versions/<content_type>/<content_id>/
//!     partition.json        # highest number ever assigned
//!     0000000001.json       # one file per version
//!   entities/<content_type>/<content_id>.json
//! ```

use crate::{
    check_entity_type, EntityStore, ListOptions, StoreError, StoreResult, VersionPage,
    VersionStore,
};
use async_trait::async_trait;
use folio_snapshot::{ContentKey, ContentSnapshot, ContentType, ContentVersion, NewVersion};
use folio_util::path::is_safe_component;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

const PARTITION_FILE: &str = "partition.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct PartitionMeta {
    last_number: u32,
}

/// JSON file-backed version table.
///
/// Writes to all partitions are serialized through one lock, so version
/// numbers are unique within a process. Separate processes sharing the same
/// directory are not coordinated.
pub struct JsonVersionStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonVersionStore {
    /// Create a store rooted at `base_path`; versions live in `base_path/versions`.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            root: base_path.into().join("versions"),
            write_lock: Mutex::new(()),
        }
    }

    fn partition_dir(&self, key: &ContentKey) -> StoreResult<PathBuf> {
        if !is_safe_component(&key.content_id) {
            return Err(StoreError::invalid_key(format!(
                "Invalid content id: {}",
                key.content_id
            )));
        }
        Ok(self
            .root
            .join(key.content_type.as_str())
            .join(&key.content_id))
    }

    fn version_path(dir: &Path, version_number: u32) -> PathBuf {
        dir.join(format!("{version_number:010}.json"))
    }

    /// Version numbers present on disk, oldest first.
    async fn version_numbers(dir: &Path) -> StoreResult<Vec<u32>> {
        let mut numbers = Vec::new();

        match fs::read_dir(dir).await {
            Ok(mut entries) => {
                while let Some(entry) = entries.next_entry().await? {
                    let path = entry.path();
                    if path.extension().is_some_and(|ext| ext == "json") {
                        if let Some(number) = path
                            .file_stem()
                            .and_then(|s| s.to_str())
                            .and_then(|s| s.parse::<u32>().ok())
                        {
                            numbers.push(number);
                        }
                    }
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(StoreError::Io(e)),
        }

        numbers.sort_unstable();
        Ok(numbers)
    }

    /// All versions of a partition, oldest first. Unreadable files are skipped.
    async fn load_all(&self, dir: &Path) -> StoreResult<Vec<ContentVersion>> {
        let mut versions = Vec::new();
        for number in Self::version_numbers(dir).await? {
            let path = Self::version_path(dir, number);
            match read_json::<ContentVersion>(&path).await {
                Ok(Some(version)) => versions.push(version),
                Ok(None) => {}
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable version"),
            }
        }
        Ok(versions)
    }
}

#[async_trait]
impl VersionStore for JsonVersionStore {
    async fn create_version(&self, request: NewVersion) -> StoreResult<ContentVersion> {
        request.validate()?;
        let dir = self.partition_dir(&request.key)?;

        let _guard = self.write_lock.lock().await;

        let meta_path = dir.join(PARTITION_FILE);
        let meta: PartitionMeta = read_json(&meta_path).await?.unwrap_or_default();
        let on_disk = Self::version_numbers(&dir).await?.last().copied().unwrap_or(0);
        let meta = PartitionMeta {
            last_number: meta.last_number.max(on_disk) + 1,
        };

        // The counter is persisted first; a failed version write leaves a gap.
        write_json(&meta_path, &meta).await?;
        let version = request.into_version(meta.last_number);
        write_json(&Self::version_path(&dir, version.version_number), &version).await?;

        info!(
            key = %version.key(),
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
        let dir = self.partition_dir(key)?;
        debug!(path = %dir.display(), "Listing versions");

        let mut versions = self.load_all(&dir).await?;
        versions.reverse();
        Ok(VersionPage::paginate(versions, options))
    }

    async fn get_version(
        &self,
        key: &ContentKey,
        version_number: u32,
    ) -> StoreResult<Option<ContentVersion>> {
        let dir = self.partition_dir(key)?;
        read_json(&Self::version_path(&dir, version_number)).await
    }

    async fn count_versions(&self, key: &ContentKey) -> StoreResult<u64> {
        let dir = self.partition_dir(key)?;
        Ok(Self::version_numbers(&dir).await?.len() as u64)
    }

    async fn prune_auto_saves(&self, key: &ContentKey, keep: usize) -> StoreResult<usize> {
        let dir = self.partition_dir(key)?;
        let _guard = self.write_lock.lock().await;

        let auto_saves: Vec<u32> = self
            .load_all(&dir)
            .await?
            .into_iter()
            .filter(|v| v.is_auto_save)
            .map(|v| v.version_number)
            .collect();
        let excess = auto_saves.len().saturating_sub(keep);

        let mut pruned = 0;
        for number in &auto_saves[..excess] {
            match fs::remove_file(Self::version_path(&dir, *number)).await {
                Ok(()) => pruned += 1,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(StoreError::Io(e)),
            }
        }

        if pruned > 0 {
            debug!(key = %key, pruned, "Pruned auto-save versions");
        }
        Ok(pruned)
    }
}

/// JSON file-backed live entity records.
#[derive(Clone)]
pub struct JsonEntityStore {
    root: PathBuf,
}

impl JsonEntityStore {
    /// Create a store rooted at `base_path`; entities live in `base_path/entities`.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            root: base_path.into().join("entities"),
        }
    }

    fn entity_path(&self, key: &ContentKey) -> StoreResult<PathBuf> {
        if !is_safe_component(&key.content_id) {
            return Err(StoreError::invalid_key(format!(
                "Invalid content id: {}",
                key.content_id
            )));
        }
        Ok(self
            .root
            .join(key.content_type.as_str())
            .join(format!("{}.json", key.content_id)))
    }
}

#[async_trait]
impl EntityStore for JsonEntityStore {
    async fn load(&self, key: &ContentKey) -> StoreResult<Option<ContentSnapshot>> {
        let path = self.entity_path(key)?;
        read_json(&path).await
    }

    async fn save(&self, key: &ContentKey, snapshot: &ContentSnapshot) -> StoreResult<()> {
        check_entity_type(key, snapshot)?;
        let path = self.entity_path(key)?;
        write_json(&path, snapshot).await?;
        debug!(key = %key, "Saved entity");
        Ok(())
    }

    async fn list_ids(&self, content_type: ContentType) -> StoreResult<Vec<String>> {
        let dir = self.root.join(content_type.as_str());
        let mut ids = Vec::new();

        match fs::read_dir(&dir).await {
            Ok(mut entries) => {
                while let Some(entry) = entries.next_entry().await? {
                    let path = entry.path();
                    if path.extension().is_some_and(|ext| ext == "json") {
                        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                            ids.push(stem.to_string());
                        }
                    }
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(StoreError::Io(e)),
        }

        ids.sort();
        Ok(ids)
    }
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> StoreResult<Option<T>> {
    debug!(path = %path.display(), "Reading from store");
    match fs::read_to_string(path).await {
        Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StoreError::Io(e)),
    }
}

/// Write atomically: temp file first, then rename over the target.
async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> StoreResult<()> {
    debug!(path = %path.display(), "Writing to store");
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let content = serde_json::to_string_pretty(value)?;
    let temp_path = path.with_extension("json.tmp");
    fs::write(&temp_path, &content).await?;
    fs::rename(&temp_path, path).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_snapshot::BlogPost;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn key() -> ContentKey {
        ContentKey::new(ContentType::Blog, "blg_1")
    }

    fn blog(title: &str) -> ContentSnapshot {
        ContentSnapshot::Blog(BlogPost {
            title: title.to_string(),
            tags: vec!["rust".to_string()],
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let dir = tempdir().unwrap();
        let store = JsonVersionStore::new(dir.path());

        let created = store
            .create_version(NewVersion::manual(key(), blog("First"), "editor").with_summary("init"))
            .await
            .unwrap();
        assert_eq!(created.version_number, 1);

        let read = store.get_version(&key(), 1).await.unwrap().unwrap();
        assert_eq!(read, created);
        assert_eq!(read.snapshot().unwrap(), blog("First"));
        assert!(dir
            .path()
            .join("versions/blog/blg_1/0000000001.json")
            .exists());
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let dir = tempdir().unwrap();
        let store = JsonVersionStore::new(dir.path());
        assert!(store.get_version(&key(), 1).await.unwrap().is_none());
        assert_eq!(store.count_versions(&key()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_numbering_survives_reopen() {
        let dir = tempdir().unwrap();
        {
            let store = JsonVersionStore::new(dir.path());
            store
                .create_version(NewVersion::manual(key(), blog("a"), "e"))
                .await
                .unwrap();
        }

        let store = JsonVersionStore::new(dir.path());
        let next = store
            .create_version(NewVersion::manual(key(), blog("b"), "e"))
            .await
            .unwrap();
        assert_eq!(next.version_number, 2);
    }

    #[tokio::test]
    async fn test_concurrent_creates_get_distinct_numbers() {
        let dir = tempdir().unwrap();
        let store = Arc::new(JsonVersionStore::new(dir.path()));

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .create_version(NewVersion::auto_save(key(), blog(&format!("t{i}")), "e"))
                        .await
                        .unwrap()
                        .version_number
                })
            })
            .collect();

        let mut numbers = Vec::new();
        for handle in handles {
            numbers.push(handle.await.unwrap());
        }
        numbers.sort_unstable();
        assert_eq!(numbers, (1..=16).collect::<Vec<u32>>());
        assert_eq!(store.count_versions(&key()).await.unwrap(), 16);
    }

    #[tokio::test]
    async fn test_failed_counter_write_never_reuses_numbers() {
        let dir = tempdir().unwrap();
        let store = JsonVersionStore::new(dir.path());
        store
            .create_version(NewVersion::manual(key(), blog("first"), "e"))
            .await
            .unwrap();

        // A directory in place of the temp file makes the counter write fail.
        let blocker = dir.path().join("versions/blog/blg_1/partition.json.tmp");
        std::fs::create_dir(&blocker).unwrap();
        let failed = store
            .create_version(NewVersion::manual(key(), blog("lost"), "e"))
            .await;
        assert!(matches!(failed, Err(StoreError::Io(_))));
        assert!(store.get_version(&key(), 2).await.unwrap().is_none());
        std::fs::remove_dir(&blocker).unwrap();

        let second = store
            .create_version(NewVersion::manual(key(), blog("second"), "e"))
            .await
            .unwrap();
        assert_eq!(second.version_number, 2);
        let first = store.get_version(&key(), 1).await.unwrap().unwrap();
        assert_eq!(first.snapshot().unwrap(), blog("first"));
    }

    #[tokio::test]
    async fn test_failed_version_write_leaves_a_gap() {
        let dir = tempdir().unwrap();
        let store = JsonVersionStore::new(dir.path());
        store
            .create_version(NewVersion::manual(key(), blog("first"), "e"))
            .await
            .unwrap();

        let blocker = dir.path().join("versions/blog/blg_1/0000000002.json.tmp");
        std::fs::create_dir(&blocker).unwrap();
        assert!(store
            .create_version(NewVersion::manual(key(), blog("lost"), "e"))
            .await
            .is_err());
        std::fs::remove_dir(&blocker).unwrap();

        let next = store
            .create_version(NewVersion::manual(key(), blog("next"), "e"))
            .await
            .unwrap();
        assert_eq!(next.version_number, 3);
        assert_eq!(store.count_versions(&key()).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_stale_counter_skips_numbers_on_disk() {
        let dir = tempdir().unwrap();
        let store = JsonVersionStore::new(dir.path());
        for title in ["a", "b"] {
            store
                .create_version(NewVersion::manual(key(), blog(title), "e"))
                .await
                .unwrap();
        }
        std::fs::write(
            dir.path().join("versions/blog/blg_1/partition.json"),
            r#"{"last_number": 0}"#,
        )
        .unwrap();

        let next = store
            .create_version(NewVersion::manual(key(), blog("c"), "e"))
            .await
            .unwrap();
        assert_eq!(next.version_number, 3);
        let kept = store.get_version(&key(), 2).await.unwrap().unwrap();
        assert_eq!(kept.snapshot().unwrap(), blog("b"));
    }

    #[tokio::test]
    async fn test_list_filters_and_orders() {
        let dir = tempdir().unwrap();
        let store = JsonVersionStore::new(dir.path());

        store
            .create_version(NewVersion::manual(key(), blog("m"), "e"))
            .await
            .unwrap();
        store
            .create_version(NewVersion::auto_save(key(), blog("a1"), "e"))
            .await
            .unwrap();
        store
            .create_version(NewVersion::auto_save(key(), blog("a2"), "e"))
            .await
            .unwrap();

        let all = store
            .list_versions(&key(), &ListOptions::default())
            .await
            .unwrap();
        let numbers: Vec<u32> = all.versions.iter().map(|v| v.version_number).collect();
        assert_eq!(numbers, vec![3, 2, 1]);

        let manual = store
            .list_versions(&key(), &ListOptions::manual_only())
            .await
            .unwrap();
        assert_eq!(manual.total, 1);
        assert_eq!(manual.versions[0].version_number, 1);
    }

    #[tokio::test]
    async fn test_prune_auto_saves() {
        let dir = tempdir().unwrap();
        let store = JsonVersionStore::new(dir.path());

        store
            .create_version(NewVersion::manual(key(), blog("m"), "e"))
            .await
            .unwrap();
        for i in 0..4 {
            store
                .create_version(NewVersion::auto_save(key(), blog(&format!("a{i}")), "e"))
                .await
                .unwrap();
        }

        assert_eq!(store.prune_auto_saves(&key(), 1).await.unwrap(), 3);
        assert_eq!(store.count_versions(&key()).await.unwrap(), 2);
        assert!(store.get_version(&key(), 1).await.unwrap().is_some());
        assert!(store.get_version(&key(), 5).await.unwrap().is_some());
        assert!(store.get_version(&key(), 2).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_invalid_content_id() {
        let dir = tempdir().unwrap();
        let store = JsonVersionStore::new(dir.path());
        let bad = ContentKey::new(ContentType::Blog, "../etc");

        let result = store
            .create_version(NewVersion::manual(bad.clone(), blog("x"), "e"))
            .await;
        assert!(matches!(result, Err(StoreError::InvalidKey(_))));
        assert!(store.count_versions(&bad).await.is_err());
    }

    #[tokio::test]
    async fn test_entity_store_roundtrip() {
        let dir = tempdir().unwrap();
        let store = JsonEntityStore::new(dir.path());

        assert!(store.load(&key()).await.unwrap().is_none());
        store.save(&key(), &blog("Live")).await.unwrap();
        assert_eq!(store.load(&key()).await.unwrap(), Some(blog("Live")));
        assert_eq!(
            store.list_ids(ContentType::Blog).await.unwrap(),
            vec!["blg_1".to_string()]
        );
        assert!(store
            .list_ids(ContentType::Roadmap)
            .await
            .unwrap()
            .is_empty());
    }
}
