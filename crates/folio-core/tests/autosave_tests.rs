//! Auto-save timing scenarios, run on a paused clock.

use folio_core::{AutoSaveConfig, AutoSaveHandle, AutoSaveStatus};
use folio_snapshot::{ContentKey, ContentSnapshot, ContentType, NewVersion};
use folio_store::{ListOptions, MemoryVersionStore, VersionStore};
use folio_test_utils::{BlogPostBuilder, MockVersionStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

fn key() -> ContentKey {
    ContentKey::new(ContentType::Blog, "blg_autosave")
}

fn config() -> AutoSaveConfig {
    AutoSaveConfig {
        enabled: true,
        interval_ms: 30_000,
        debounce_ms: 2_000,
        max_auto_saves: 10,
    }
}

fn draft(title: &str) -> ContentSnapshot {
    BlogPostBuilder::new().title(title).build()
}

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

#[tokio::test(start_paused = true)]
async fn test_five_edits_over_three_seconds_save_once() {
    let store = Arc::new(MockVersionStore::new());
    let handle = AutoSaveHandle::spawn(store.clone(), key(), None, config(), "editor");

    // Edits at 0, 750, 1500, 2250 and 3000 ms
    for i in 0..5 {
        if i > 0 {
            sleep(ms(750)).await;
        }
        handle.update(draft(&format!("Draft {i}")));
    }

    sleep(ms(1_900)).await;
    assert!(store.create_calls().is_empty());

    sleep(ms(200)).await;
    let calls = store.create_calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].is_auto_save);
    assert_eq!(calls[0].snapshot, draft("Draft 4"));

    sleep(Duration::from_secs(60)).await;
    assert_eq!(store.create_calls().len(), 1);

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_rapid_edits_save_last_snapshot() {
    let store = Arc::new(MockVersionStore::new());
    let handle = AutoSaveHandle::spawn(store.clone(), key(), None, config(), "editor");

    for i in 0..20 {
        handle.update(draft(&format!("Edit {i}")));
        sleep(ms(100)).await;
    }
    sleep(ms(2_100)).await;

    let calls = store.create_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].snapshot, draft("Edit 19"));

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_retention_cap_keeps_manual_versions() {
    let store = Arc::new(MemoryVersionStore::new());
    let handle = AutoSaveHandle::spawn(store.clone(), key(), None, config(), "editor");

    store
        .create_version(NewVersion::manual(key(), draft("Manual 1"), "editor"))
        .await
        .unwrap();
    for i in 0..15 {
        if i == 7 {
            store
                .create_version(NewVersion::manual(key(), draft("Manual 2"), "editor"))
                .await
                .unwrap();
        }
        handle.update(draft(&format!("Auto {i}")));
        handle.flush().await;
    }

    let page = store
        .list_versions(&key(), &ListOptions::default().per_page(100))
        .await
        .unwrap();
    let auto: Vec<String> = page
        .versions
        .iter()
        .filter(|v| v.is_auto_save)
        .map(|v| v.snapshot().unwrap().title().to_string())
        .collect();
    let manual = page.versions.iter().filter(|v| !v.is_auto_save).count();

    assert_eq!(manual, 2);
    assert_eq!(auto.len(), 10);
    assert_eq!(auto.first().map(String::as_str), Some("Auto 14"));
    assert_eq!(auto.last().map(String::as_str), Some("Auto 5"));

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_failed_save_retries_after_interval() {
    let store = Arc::new(MockVersionStore::new().failing(1));
    let handle = AutoSaveHandle::spawn(store.clone(), key(), None, config(), "editor");

    handle.update(draft("Unsaved"));
    sleep(ms(2_100)).await;

    let state = handle.state();
    assert_eq!(state.status, AutoSaveStatus::Error);
    assert!(state.last_error.is_some());
    assert!(state.has_pending);
    assert_eq!(store.create_calls().len(), 1);

    sleep(ms(29_000)).await;
    assert_eq!(store.create_calls().len(), 1);

    sleep(ms(1_000)).await;
    let calls = store.create_calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[1].snapshot, draft("Unsaved"));

    let state = handle.state();
    assert_eq!(state.status, AutoSaveStatus::Saved);
    assert_eq!(state.last_error, None);
    assert_eq!(state.last_version, Some(1));

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_new_edit_after_failure_is_saved_after_debounce() {
    let store = Arc::new(MockVersionStore::new().failing(1));
    let handle = AutoSaveHandle::spawn(store.clone(), key(), None, config(), "editor");

    handle.update(draft("First"));
    sleep(ms(2_100)).await;
    assert_eq!(handle.state().status, AutoSaveStatus::Error);

    handle.update(draft("Second"));
    sleep(ms(2_100)).await;

    let calls = store.create_calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[1].snapshot, draft("Second"));
    assert_eq!(handle.state().status, AutoSaveStatus::Saved);

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_disable_cancels_pending_save() {
    let store = Arc::new(MockVersionStore::new());
    let handle = AutoSaveHandle::spawn(store.clone(), key(), None, config(), "editor");

    handle.update(draft("Leaving"));
    sleep(ms(1_000)).await;
    handle.set_enabled(false);
    sleep(Duration::from_secs(10)).await;

    assert!(store.create_calls().is_empty());
    assert!(!handle.state().has_pending);

    // Edits while disabled are not picked up after re-enabling
    handle.update(draft("Ignored"));
    handle.set_enabled(true);
    sleep(Duration::from_secs(10)).await;
    assert!(store.create_calls().is_empty());

    handle.update(draft("Back"));
    sleep(ms(2_100)).await;
    assert_eq!(store.create_calls().len(), 1);

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_result_ignored_when_disabled_in_flight() {
    let store = Arc::new(MockVersionStore::new().gated());
    let handle = AutoSaveHandle::spawn(store.clone(), key(), None, config(), "editor");

    handle.update(draft("In flight"));
    sleep(ms(2_100)).await;
    assert_eq!(handle.state().status, AutoSaveStatus::Saving);

    handle.set_enabled(false);
    sleep(ms(10)).await;
    store.release(1);
    sleep(ms(10)).await;

    // The request itself completes; only its outcome is dropped
    assert_eq!(store.count_versions(&key()).await.unwrap(), 1);
    let state = handle.state();
    assert_eq!(state.status, AutoSaveStatus::Idle);
    assert_eq!(state.last_version, None);

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_at_most_one_save_in_flight() {
    let store = Arc::new(MockVersionStore::new().gated());
    let config = AutoSaveConfig {
        interval_ms: 1,
        debounce_ms: 100,
        ..config()
    };
    let handle = AutoSaveHandle::spawn(store.clone(), key(), None, config, "editor");

    handle.update(draft("A"));
    sleep(ms(200)).await;
    assert_eq!(store.create_calls().len(), 1);

    for title in ["B", "C", "D"] {
        handle.update(draft(title));
        sleep(ms(500)).await;
    }
    sleep(Duration::from_secs(10)).await;
    assert_eq!(store.create_calls().len(), 1);

    store.release(1);
    sleep(ms(10)).await;
    let calls = store.create_calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[1].snapshot, draft("D"));

    store.release(1);
    sleep(ms(10)).await;
    assert_eq!(store.count_versions(&key()).await.unwrap(), 2);
    assert_eq!(store.max_concurrent_creates(), 1);

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_offline_holds_saves_until_reconnect() {
    let store = Arc::new(MockVersionStore::new());
    let handle = AutoSaveHandle::spawn(store.clone(), key(), None, config(), "editor");

    handle.set_online(false);
    handle.update(draft("On the train"));
    sleep(Duration::from_secs(10)).await;

    assert!(store.create_calls().is_empty());
    assert_eq!(handle.state().status, AutoSaveStatus::Offline);

    handle.set_online(true);
    sleep(ms(10)).await;
    assert_eq!(store.create_calls().len(), 1);
    assert_eq!(handle.state().status, AutoSaveStatus::Saved);

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_unchanged_content_is_not_saved() {
    let store = Arc::new(MockVersionStore::new());
    let live = draft("Published");
    let handle =
        AutoSaveHandle::spawn(store.clone(), key(), Some(live.clone()), config(), "editor");

    handle.update(draft("Typo"));
    sleep(ms(500)).await;
    handle.update(live);
    sleep(Duration::from_secs(5)).await;

    assert!(store.create_calls().is_empty());
    assert_eq!(handle.state().status, AutoSaveStatus::Idle);

    handle.shutdown().await;
}
