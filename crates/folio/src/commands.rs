//! Command handlers.

use crate::render;
use folio_core::{Config, EditorSession, Stores};
use folio_snapshot::{ContentKey, ContentType};
use folio_store::{ListOptions, StoreError};
use std::path::PathBuf;

/// Print identifiers of all entities of one type.
pub async fn list(stores: &Stores, content_type: ContentType) -> anyhow::Result<()> {
    let ids = stores.entities.list_ids(content_type).await?;
    if ids.is_empty() {
        println!("No {content_type} entries found.");
    }
    for id in ids {
        println!("{id}");
    }
    Ok(())
}

pub async fn history(
    stores: &Stores,
    key: &ContentKey,
    include_auto_saves: bool,
    page: u32,
    per_page: u32,
    json: bool,
) -> anyhow::Result<()> {
    let options = ListOptions {
        include_auto_saves,
        ..ListOptions::default()
    }
    .page(page)
    .per_page(per_page);
    let page = stores.versions.list_versions(key, &options).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&page)?);
        return Ok(());
    }

    if page.versions.is_empty() {
        println!("No versions found for {key}.");
        return Ok(());
    }

    print!("{}", render::history_table(&page.versions));
    if page.has_more {
        println!();
        println!(
            "Page {} of {} versions; use --page {} for more.",
            page.page,
            page.total,
            page.page + 1
        );
    }
    Ok(())
}

pub async fn show(stores: &Stores, key: &ContentKey, version_number: u32) -> anyhow::Result<()> {
    let version = stores
        .versions
        .get_version(key, version_number)
        .await?
        .ok_or_else(|| StoreError::version_not_found(key, version_number))?;
    println!("{}", serde_json::to_string_pretty(&version)?);
    Ok(())
}

/// Compare two versions, or a version with the live record when `to` is `None`.
pub async fn diff(
    stores: &Stores,
    config: &Config,
    key: ContentKey,
    from: u32,
    to: Option<u32>,
) -> anyhow::Result<()> {
    let session = open_session(stores, config, key).await?;

    let changes = match to {
        Some(to) => {
            println!("Changes from v{from} to v{to}:");
            session.diff(from, to).await?.changes
        }
        None => {
            println!("Changes from v{from} to the live record:");
            session.diff_with_current(from).await?
        }
    };
    print!("{}", render::changes(&changes));

    session.close().await;
    Ok(())
}

/// Show what restoring would change, and apply it when confirmed.
pub async fn restore(
    stores: &Stores,
    config: &Config,
    key: ContentKey,
    version_number: u32,
    confirmed: bool,
    record: bool,
) -> anyhow::Result<()> {
    let mut session = open_session(stores, config, key.clone()).await?;
    let pending = session.prepare_restore(version_number).await?;

    if pending.changes.is_empty() {
        println!("{key} already matches v{version_number}.");
        session.close().await;
        return Ok(());
    }

    println!("Restoring v{version_number} changes {key}:");
    print!("{}", render::changes(&pending.changes));

    if !confirmed {
        println!();
        println!("Nothing changed. Re-run with --yes to restore.");
        session.close().await;
        return Ok(());
    }

    session.confirm_restore(pending)?;
    session.save().await?;
    println!("Restored {key} to v{version_number}.");

    if record {
        let summary = format!("Restored from v{version_number}");
        let version = session.save_version(Some(&summary)).await?;
        println!("Recorded as {}.", version.label());
    }

    session.close().await;
    Ok(())
}

pub async fn count(stores: &Stores, key: &ContentKey) -> anyhow::Result<()> {
    let count = stores.versions.count_versions(key).await?;
    println!("{count}");
    Ok(())
}

pub async fn prune(stores: &Stores, key: &ContentKey, keep: usize) -> anyhow::Result<()> {
    let pruned = stores.versions.prune_auto_saves(key, keep).await?;
    println!("Pruned {pruned} auto-save version(s) of {key}.");
    Ok(())
}

pub fn show_config(config: &Config, sources: &[PathBuf]) -> anyhow::Result<()> {
    println!("Configuration sources:");
    if sources.is_empty() {
        println!("  (none)");
    } else {
        for source in sources {
            println!("  {}", source.display());
        }
    }
    println!();

    println!("Current configuration:");
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}

/// Open an entity for a one-shot command; nothing is auto-saved.
async fn open_session(
    stores: &Stores,
    config: &Config,
    key: ContentKey,
) -> anyhow::Result<EditorSession> {
    let mut config = config.clone();
    config.autosave.enabled = false;
    Ok(EditorSession::open(stores.clone(), key, &config).await?)
}
