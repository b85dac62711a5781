//! Idle-tab archival sweep.
//!
//! A sweep walks every non-pinned tab once:
//!
//! 1. In-use (active or audible) and bookmarked tabs get their activity
//!    refreshed and are skipped.
//! 2. Tabs with no activity record, or one older than the idle threshold,
//!    are re-verified with the host (they may have closed since the query).
//! 3. Surviving grouped candidates are archived, closed, and forgotten.
//!    Ungrouped candidates are left alone and reconsidered next sweep.
//!
//! Loading settings, the space list, the tab list or the activity snapshot
//! must all succeed before anything is archived. After that, a failure on
//! one candidate abandons that candidate only.
//!
//! At most one sweep runs at a time; an overlapping call returns
//! [`SweepOutcome::AlreadyRunning`] without touching anything.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tabkeep_core::{Clock, LifecycleError, SpaceId, TabId};
use tabkeep_settings::{AutoArchiveSettings, SharedSettings};
use tabkeep_store::{
    ActivitySnapshot, ActivityTracker, AddOutcome, ArchiveStore, ArchivedTabEntry, NewArchivedTab,
};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::events::{EventBus, LifecycleEvent};
use crate::host::{
    HostError, SpaceRegistry, TabHost, TabInfo, TabQuery, bookmark_exclusion_set,
};

/// How a sweep ended.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "camelCase")]
pub enum SweepOutcome {
    /// Every tab was examined.
    #[default]
    Completed,
    /// Auto-archive is off or the idle window is zero.
    Disabled,
    /// Another sweep was in progress.
    AlreadyRunning,
    /// A prerequisite read failed; nothing was archived.
    Aborted(String),
}

/// What one sweep did.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepReport {
    /// How the sweep ended.
    pub outcome: SweepOutcome,
    /// Non-pinned tabs looked at.
    pub examined: usize,
    /// In-use or bookmarked tabs whose activity was refreshed.
    pub refreshed: Vec<TabId>,
    /// Tabs archived and closed.
    pub archived: Vec<TabId>,
    /// Idle tabs left open because they belong to no space.
    pub ungrouped: Vec<TabId>,
    /// Tabs found closed during re-verification; their activity was cleared.
    pub stale_cleared: Vec<TabId>,
    /// Tabs abandoned after a store or host failure.
    pub failed: Vec<TabId>,
}

impl SweepReport {
    fn skipped(outcome: SweepOutcome) -> Self {
        Self {
            outcome,
            ..Self::default()
        }
    }

    /// Whether the sweep walked the tab list.
    pub fn ran(&self) -> bool {
        self.outcome == SweepOutcome::Completed
    }
}

/// Decides which tabs are idle and archives them.
pub struct IdleArchivalEngine {
    tabs: Arc<dyn TabHost>,
    spaces: Arc<dyn SpaceRegistry>,
    tracker: ActivityTracker,
    archive: ArchiveStore,
    settings: SharedSettings,
    clock: Arc<dyn Clock>,
    events: EventBus,
    sweep_lock: Mutex<()>,
}

impl IdleArchivalEngine {
    /// Wire an engine to its collaborators.
    pub fn new(
        tabs: Arc<dyn TabHost>,
        spaces: Arc<dyn SpaceRegistry>,
        tracker: ActivityTracker,
        archive: ArchiveStore,
        settings: SharedSettings,
        clock: Arc<dyn Clock>,
        events: EventBus,
    ) -> Self {
        Self {
            tabs,
            spaces,
            tracker,
            archive,
            settings,
            clock,
            events,
            sweep_lock: Mutex::new(()),
        }
    }

    /// Whether a sweep is running right now.
    pub fn is_sweeping(&self) -> bool {
        self.sweep_lock.try_lock().is_err()
    }

    /// Run one sweep. Never fails; see [`SweepReport`].
    pub async fn sweep(&self) -> SweepReport {
        let settings = self.settings.auto_archive();
        if !settings.is_active() {
            debug!(
                enabled = settings.enabled,
                idle_minutes = settings.idle_minutes,
                "auto-archive inactive, sweep skipped"
            );
            return SweepReport::skipped(SweepOutcome::Disabled);
        }

        let Ok(_guard) = self.sweep_lock.try_lock() else {
            debug!("sweep already in progress, skipping");
            return SweepReport::skipped(SweepOutcome::AlreadyRunning);
        };

        let report = self.run(settings).await;
        info!(
            examined = report.examined,
            archived = report.archived.len(),
            failed = report.failed.len(),
            outcome = ?report.outcome,
            "sweep finished"
        );
        self.events.emit(LifecycleEvent::SweepCompleted {
            report: report.clone(),
        });
        report
    }

    async fn run(&self, settings: AutoArchiveSettings) -> SweepReport {
        let mut report = SweepReport::default();
        let threshold = settings.idle_threshold_millis();
        let now = self.clock.now_millis();

        let prerequisites = self.load_prerequisites().await;
        let (excluded, tabs, activity) = match prerequisites {
            Ok(loaded) => loaded,
            Err(e) => {
                warn!(error = %e, kind = e.kind(), "sweep aborted");
                report.outcome = SweepOutcome::Aborted(e.to_string());
                return report;
            }
        };

        let mut candidates = Vec::new();
        for tab in tabs {
            if tab.pinned {
                continue;
            }
            report.examined += 1;

            if tab.in_use() {
                debug!(tab_id = %tab.id, "tab in use, refreshing");
                self.refresh(tab.id, &mut report).await;
                continue;
            }
            if excluded.contains(&tab.url) {
                debug!(tab_id = %tab.id, url = %tab.url, "tab bookmarked, refreshing");
                self.refresh(tab.id, &mut report).await;
                continue;
            }

            let idle = activity
                .get(&tab.id)
                .is_none_or(|last| now - last > threshold);
            if !idle {
                continue;
            }

            match self.tabs.get_tab(tab.id).await {
                Ok(Some(current)) if current.pinned || current.in_use() => {
                    debug!(tab_id = %tab.id, "tab became busy before archival, refreshing");
                    self.refresh(tab.id, &mut report).await;
                }
                Ok(Some(current)) => candidates.push(current),
                Ok(None) | Err(HostError::TabNotFound(_)) => {
                    debug!(tab_id = %tab.id, "idle tab already closed, clearing activity");
                    self.forget(tab.id).await;
                    report.stale_cleared.push(tab.id);
                }
                Err(e) => {
                    warn!(tab_id = %tab.id, error = %e, "tab lookup failed, skipping");
                    report.failed.push(tab.id);
                }
            }
        }

        for tab in candidates {
            let Some(space_id) = tab.group.space_id() else {
                debug!(tab_id = %tab.id, "idle tab is ungrouped, leaving open");
                report.ungrouped.push(tab.id);
                continue;
            };
            match self.archive_and_close(&tab, space_id).await {
                Ok(_) => report.archived.push(tab.id),
                Err(e) => {
                    warn!(
                        tab_id = %tab.id,
                        space_id = %space_id,
                        error = %e,
                        kind = e.kind(),
                        "archiving idle tab failed"
                    );
                    report.failed.push(tab.id);
                }
            }
        }

        report
    }

    async fn load_prerequisites(
        &self,
    ) -> Result<(HashSet<String>, Vec<TabInfo>, ActivitySnapshot), LifecycleError> {
        let excluded = bookmark_exclusion_set(self.spaces.as_ref()).await?;
        let tabs = self.tabs.query_tabs(TabQuery::unpinned()).await?;
        let activity = self.tracker.snapshot().await?;
        Ok((excluded, tabs, activity))
    }

    /// Archive `tab` under `space_id`, close it and clear its activity.
    ///
    /// A tab whose `(url, space)` is already archived is still closed; the
    /// existing entry keeps its original time. Returns the new entry, or
    /// `None` for a duplicate. A tab that vanished before the close counts
    /// as closed.
    pub async fn archive_and_close(
        &self,
        tab: &TabInfo,
        space_id: SpaceId,
    ) -> Result<Option<ArchivedTabEntry>, LifecycleError> {
        let outcome = self
            .archive
            .add(NewArchivedTab {
                url: tab.url.clone(),
                name: tab.display_name().to_string(),
                space_id: Some(space_id),
            })
            .await?;

        match self.tabs.close_tab(tab.id).await {
            Ok(()) | Err(HostError::TabNotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }
        self.forget(tab.id).await;

        match outcome {
            AddOutcome::Added { entry, evicted } => {
                info!(
                    tab_id = %tab.id,
                    space_id = %space_id,
                    url = %entry.url,
                    evicted = evicted.len(),
                    "tab archived"
                );
                self.events.emit(LifecycleEvent::TabArchived {
                    tab_id: tab.id,
                    entry: entry.clone(),
                });
                Ok(Some(entry))
            }
            AddOutcome::AlreadyArchived => {
                info!(tab_id = %tab.id, url = %tab.url, "tab already archived, closed");
                Ok(None)
            }
        }
    }

    async fn refresh(&self, tab_id: TabId, report: &mut SweepReport) {
        match self.tracker.record_activity(tab_id).await {
            Ok(()) => report.refreshed.push(tab_id),
            Err(e) => {
                warn!(tab_id = %tab_id, error = %e, "refreshing activity failed");
                report.failed.push(tab_id);
            }
        }
    }

    async fn forget(&self, tab_id: TabId) {
        if let Err(e) = self.tracker.clear_activity(tab_id).await {
            warn!(tab_id = %tab_id, error = %e, "clearing activity failed");
        }
    }
}

impl std::fmt::Debug for IdleArchivalEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdleArchivalEngine")
            .field("archive_capacity", &self.archive.capacity())
            .field("sweeping", &self.is_sweeping())
            .finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
