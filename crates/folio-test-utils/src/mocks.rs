//! Store doubles for testing.
//!
//! [`MockVersionStore`] wraps an in-memory store and adds the knobs tests need
//! to exercise the auto-saver: injected failures, a gate that holds creates
//! until released, and a record of every create request.

use async_trait::async_trait;
use folio_snapshot::{ContentKey, ContentVersion, NewVersion};
use folio_store::{
    ListOptions, MemoryVersionStore, StoreError, StoreResult, VersionPage, VersionStore,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

/// A version store with failure injection and call recording.
///
/// # Example
///
/// ```rust
/// use folio_snapshot::{ContentKey, ContentSnapshot, ContentType, NewVersion};
/// use folio_store::VersionStore;
/// use folio_test_utils::mocks::MockVersionStore;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let store = MockVersionStore::new().failing(1);
/// let key = ContentKey::new(ContentType::Blog, "blg_1");
/// let request = NewVersion::auto_save(key, ContentSnapshot::empty(ContentType::Blog), "me");
///
/// assert!(store.create_version(request.clone()).await.is_err());
/// assert!(store.create_version(request).await.is_ok());
/// assert_eq!(store.create_calls().len(), 2);
/// # }
/// ```
#[derive(Default)]
pub struct MockVersionStore {
    inner: MemoryVersionStore,
    /// Every create request, including failed ones.
    calls: Mutex<Vec<NewVersion>>,
    /// Number of upcoming creates that fail.
    failures: AtomicUsize,
    /// When set, each create waits for a permit.
    gate: Option<Arc<Semaphore>>,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl MockVersionStore {
    /// Create a mock that behaves like [`MemoryVersionStore`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `count` creates with a transient error.
    pub fn failing(self, count: usize) -> Self {
        self.failures.store(count, Ordering::SeqCst);
        self
    }

    /// Hold every create until [`release`](Self::release) is called.
    pub fn gated(mut self) -> Self {
        self.gate = Some(Arc::new(Semaphore::new(0)));
        self
    }

    /// Let `count` held creates proceed.
    pub fn release(&self, count: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(count);
        }
    }

    /// Requests passed to `create_version`, in call order.
    pub fn create_calls(&self) -> Vec<NewVersion> {
        self.calls.lock().unwrap().clone()
    }

    /// Highest number of creates that were running at the same time.
    pub fn max_concurrent_creates(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    fn take_failure(&self) -> bool {
        self.failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl VersionStore for MockVersionStore {
    async fn create_version(&self, request: NewVersion) -> StoreResult<ContentVersion> {
        self.calls.lock().unwrap().push(request.clone());
        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(active, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }

        let result = if self.take_failure() {
            Err(StoreError::unavailable("injected failure"))
        } else {
            self.inner.create_version(request).await
        };

        self.active.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn list_versions(
        &self,
        key: &ContentKey,
        options: &ListOptions,
    ) -> StoreResult<VersionPage> {
        self.inner.list_versions(key, options).await
    }

    async fn get_version(
        &self,
        key: &ContentKey,
        version_number: u32,
    ) -> StoreResult<Option<ContentVersion>> {
        self.inner.get_version(key, version_number).await
    }

    async fn count_versions(&self, key: &ContentKey) -> StoreResult<u64> {
        self.inner.count_versions(key).await
    }

    async fn prune_auto_saves(&self, key: &ContentKey, keep: usize) -> StoreResult<usize> {
        self.inner.prune_auto_saves(key, keep).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_snapshot::{ContentSnapshot, ContentType};

    fn request() -> NewVersion {
        NewVersion::auto_save(
            ContentKey::new(ContentType::Blog, "blg_1"),
            ContentSnapshot::empty(ContentType::Blog),
            "tester",
        )
    }

    #[tokio::test]
    async fn test_failures_are_consumed() {
        let store = MockVersionStore::new().failing(2);
        assert!(store.create_version(request()).await.is_err());
        assert!(store.create_version(request()).await.is_err());

        let version = store.create_version(request()).await.unwrap();
        assert_eq!(version.version_number, 1);
        assert_eq!(store.create_calls().len(), 3);
    }

    #[tokio::test]
    async fn test_gate_holds_creates() {
        let store = Arc::new(MockVersionStore::new().gated());
        let task = {
            let store = store.clone();
            tokio::spawn(async move { store.create_version(request()).await })
        };

        tokio::task::yield_now().await;
        assert_eq!(store.count_versions(&request().key).await.unwrap(), 0);

        store.release(1);
        task.await.unwrap().unwrap();
        assert_eq!(store.count_versions(&request().key).await.unwrap(), 1);
        assert_eq!(store.max_concurrent_creates(), 1);
    }
}
