//! Subcommand implementations.
//!
//! Each command takes an [`Env`] and a writer so tests can run against an
//! in-memory store and capture output.

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tabkeep_core::{Clock, SpaceId, TabId};
use tabkeep_lifecycle::{StoredSpaceRegistry, bookmark_exclusion_set};
use tabkeep_settings::TabkeepSettings;
use tabkeep_store::{ActivityTracker, ArchiveStore, KvStore};

/// What every command runs against.
pub struct Env {
    pub store: Arc<dyn KvStore>,
    pub clock: Arc<dyn Clock>,
    pub settings: TabkeepSettings,
}

impl Env {
    fn archive(&self) -> ArchiveStore {
        ArchiveStore::with_capacity(
            Arc::clone(&self.store),
            Arc::clone(&self.clock),
            self.settings.archive.capacity,
        )
    }

    fn tracker(&self) -> ActivityTracker {
        ActivityTracker::new(Arc::clone(&self.store), Arc::clone(&self.clock))
    }
}

fn format_millis(millis: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(millis).map_or_else(
        || format!("@{millis}"),
        |t| t.format("%Y-%m-%d %H:%M:%S").to_string(),
    )
}

fn format_age(now: i64, then: i64) -> String {
    let minutes = (now - then).max(0) / 60_000;
    if minutes < 60 {
        format!("{minutes}m ago")
    } else if minutes < 60 * 24 {
        format!("{}h{:02}m ago", minutes / 60, minutes % 60)
    } else {
        format!("{}d ago", minutes / (60 * 24))
    }
}

pub async fn archive_list(env: &Env, json: bool, out: &mut impl Write) -> Result<()> {
    let entries = env.archive().list().await.context("Failed to read archive")?;
    if json {
        serde_json::to_writer_pretty(&mut *out, &entries)?;
        writeln!(out)?;
        return Ok(());
    }
    if entries.is_empty() {
        writeln!(out, "No archived tabs.")?;
        return Ok(());
    }
    for entry in &entries {
        writeln!(
            out,
            "{}  space {:<6} {}  <{}>",
            format_millis(entry.archived_at),
            entry.space_id.get(),
            entry.name,
            entry.url
        )?;
    }
    writeln!(out, "{} of {} slots used", entries.len(), env.settings.archive.capacity)?;
    Ok(())
}

pub async fn archive_remove(env: &Env, url: &str, space: i64, out: &mut impl Write) -> Result<()> {
    let removed = env
        .archive()
        .remove(url, SpaceId::new(space))
        .await
        .context("Failed to update archive")?;
    if removed {
        tracing::info!(url, space_id = space, "archive entry removed");
        writeln!(out, "Removed {url} from space {space}.")?;
    } else {
        writeln!(out, "{url} is not archived in space {space}.")?;
    }
    Ok(())
}

pub async fn activity_show(env: &Env, json: bool, out: &mut impl Write) -> Result<()> {
    let snapshot = env.tracker().snapshot().await.context("Failed to read activity")?;
    if json {
        serde_json::to_writer_pretty(&mut *out, &snapshot)?;
        writeln!(out)?;
        return Ok(());
    }
    if snapshot.is_empty() {
        writeln!(out, "No tracked tabs.")?;
        return Ok(());
    }
    let now = env.clock.now_millis();
    let threshold = env.settings.auto_archive.idle_threshold_millis();
    for (tab_id, last) in &snapshot {
        let marker = if now - last > threshold { "  idle" } else { "" };
        writeln!(
            out,
            "tab {:<8} {}  ({}){marker}",
            tab_id.get(),
            format_millis(*last),
            format_age(now, *last)
        )?;
    }
    Ok(())
}

pub async fn activity_clear(env: &Env, tab: i64, out: &mut impl Write) -> Result<()> {
    let tab_id = TabId::new(tab);
    env.tracker()
        .clear_activity(tab_id)
        .await
        .context("Failed to update activity")?;
    writeln!(out, "Cleared activity for tab {tab_id}.")?;
    Ok(())
}

pub async fn excluded_urls(env: &Env, out: &mut impl Write) -> Result<()> {
    let registry = StoredSpaceRegistry::new(Arc::clone(&env.store));
    let mut urls: Vec<String> = bookmark_exclusion_set(&registry)
        .await
        .context("Failed to read spaces")?
        .into_iter()
        .collect();
    urls.sort();
    if urls.is_empty() {
        writeln!(out, "No bookmarked URLs.")?;
    }
    for url in urls {
        writeln!(out, "{url}")?;
    }
    Ok(())
}

pub fn settings_show(env: &Env, out: &mut impl Write) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, &env.settings)?;
    writeln!(out)?;
    let auto = &env.settings.auto_archive;
    if auto.is_active() {
        writeln!(
            out,
            "auto-archive: on, tabs idle for {} min, sweep every {}s",
            auto.idle_minutes,
            auto.sweep_period().as_secs()
        )?;
    } else {
        writeln!(out, "auto-archive: off")?;
    }
    Ok(())
}
