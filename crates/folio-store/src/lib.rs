//! Storage layer for folio.
//!
//! This crate defines the two stores the versioning core talks to:
//! - [`VersionStore`]: an append-only table of [`ContentVersion`]s, partitioned
//!   by `(content_type, content_id)`, with store-assigned version numbers
//! - [`EntityStore`]: the live record of each entity, which is what a restore
//!   eventually writes back to
//!
//! Two backends are provided for each:
//! - JSON file storage
//! - In-memory storage (for testing)

pub mod error;
pub mod json;
pub mod memory;

pub use error::{StoreError, StoreResult};
pub use json::{JsonEntityStore, JsonVersionStore};
pub use memory::{MemoryEntityStore, MemoryVersionStore};

use async_trait::async_trait;
use folio_snapshot::{ContentKey, ContentSnapshot, ContentType, ContentVersion, NewVersion};
use serde::{Deserialize, Serialize};

/// Default number of versions per history page.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Filter and pagination for [`VersionStore::list_versions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListOptions {
    /// Whether auto-save versions are included.
    pub include_auto_saves: bool,
    /// 1-based page number.
    pub page: u32,
    pub per_page: u32,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            include_auto_saves: true,
            page: 1,
            per_page: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ListOptions {
    /// Only manually saved versions.
    pub fn manual_only() -> Self {
        Self {
            include_auto_saves: false,
            ..Self::default()
        }
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    pub fn per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page.max(1);
        self
    }

    fn accepts(&self, version: &ContentVersion) -> bool {
        self.include_auto_saves || !version.is_auto_save
    }
}

/// One page of history, newest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionPage {
    pub versions: Vec<ContentVersion>,
    /// Number of versions matching the filter across all pages.
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
    pub has_more: bool,
}

impl VersionPage {
    /// Filter and slice versions that are already sorted newest first.
    pub fn paginate(newest_first: Vec<ContentVersion>, options: &ListOptions) -> Self {
        let page = options.page.max(1);
        let per_page = options.per_page.max(1);

        let matching: Vec<ContentVersion> = newest_first
            .into_iter()
            .filter(|v| options.accepts(v))
            .collect();
        let total = matching.len();
        let start = ((page - 1) as usize).saturating_mul(per_page as usize);

        let versions: Vec<ContentVersion> = matching
            .into_iter()
            .skip(start)
            .take(per_page as usize)
            .collect();
        let has_more = start + versions.len() < total;

        Self {
            versions,
            total: total as u64,
            page,
            per_page,
            has_more,
        }
    }
}

/// Append-only version table.
///
/// Implementations assign `version_number` atomically per partition: two
/// concurrent creates for the same key never receive the same number, and a
/// number is never handed out twice, even after its version was pruned.
#[async_trait]
pub trait VersionStore: Send + Sync {
    /// Persist a new version and return the stored record.
    async fn create_version(&self, request: NewVersion) -> StoreResult<ContentVersion>;

    /// List versions of one entity, newest first.
    async fn list_versions(
        &self,
        key: &ContentKey,
        options: &ListOptions,
    ) -> StoreResult<VersionPage>;

    /// Fetch one version. Returns `None` if it doesn't exist.
    async fn get_version(
        &self,
        key: &ContentKey,
        version_number: u32,
    ) -> StoreResult<Option<ContentVersion>>;

    /// Number of stored versions of one entity, auto-saves included.
    async fn count_versions(&self, key: &ContentKey) -> StoreResult<u64>;

    /// Delete the oldest auto-save versions so that at most `keep` remain.
    ///
    /// Manual versions are never touched. Returns the number deleted.
    async fn prune_auto_saves(&self, key: &ContentKey, keep: usize) -> StoreResult<usize>;

    /// Fetch the snapshot of a version so it can be applied to the live entity.
    async fn restore_version(
        &self,
        key: &ContentKey,
        version_number: u32,
    ) -> StoreResult<ContentSnapshot> {
        let version = self
            .get_version(key, version_number)
            .await?
            .ok_or_else(|| StoreError::version_not_found(key, version_number))?;
        Ok(version.snapshot()?)
    }

    /// The highest-numbered version, if any.
    async fn latest_version(&self, key: &ContentKey) -> StoreResult<Option<ContentVersion>> {
        let page = self
            .list_versions(key, &ListOptions::default().per_page(1))
            .await?;
        Ok(page.versions.into_iter().next())
    }
}

/// The live record of each entity.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Read the current state. Returns `None` if the entity doesn't exist.
    async fn load(&self, key: &ContentKey) -> StoreResult<Option<ContentSnapshot>>;

    /// Replace the current state.
    async fn save(&self, key: &ContentKey, snapshot: &ContentSnapshot) -> StoreResult<()>;

    /// Identifiers of all entities of one type.
    async fn list_ids(&self, content_type: ContentType) -> StoreResult<Vec<String>>;
}

/// Reject snapshots whose type doesn't match the key they are saved under.
fn check_entity_type(key: &ContentKey, snapshot: &ContentSnapshot) -> StoreResult<()> {
    let actual = snapshot.content_type();
    if actual != key.content_type {
        return Err(folio_snapshot::SnapshotError::TypeMismatch {
            expected: key.content_type,
            actual,
        }
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_snapshot::BlogPost;

    fn versions(count: u32, auto_every: u32) -> Vec<ContentVersion> {
        let key = ContentKey::new(ContentType::Blog, "blg_1");
        (1..=count)
            .rev()
            .map(|n| {
                let snapshot = ContentSnapshot::Blog(BlogPost {
                    title: format!("v{n}"),
                    ..Default::default()
                });
                let request = if auto_every > 0 && n % auto_every == 0 {
                    NewVersion::auto_save(key.clone(), snapshot, "editor")
                } else {
                    NewVersion::manual(key.clone(), snapshot, "editor")
                };
                request.into_version(n)
            })
            .collect()
    }

    #[test]
    fn test_paginate_first_page() {
        let page = VersionPage::paginate(versions(5, 0), &ListOptions::default().per_page(2));
        assert_eq!(page.total, 5);
        assert!(page.has_more);
        let numbers: Vec<u32> = page.versions.iter().map(|v| v.version_number).collect();
        assert_eq!(numbers, vec![5, 4]);
    }

    #[test]
    fn test_paginate_last_page() {
        let options = ListOptions::default().per_page(2).page(3);
        let page = VersionPage::paginate(versions(5, 0), &options);
        assert!(!page.has_more);
        assert_eq!(page.versions.len(), 1);
        assert_eq!(page.versions[0].version_number, 1);
    }

    #[test]
    fn test_paginate_excludes_auto_saves() {
        let page = VersionPage::paginate(versions(6, 2), &ListOptions::manual_only());
        assert_eq!(page.total, 3);
        assert!(page.versions.iter().all(|v| !v.is_auto_save));
    }

    #[test]
    fn test_page_zero_is_clamped() {
        let options = ListOptions::default().page(0);
        assert_eq!(options.page, 1);
    }
}
