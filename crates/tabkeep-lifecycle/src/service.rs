//! Lifecycle facade.
//!
//! [`TabLifecycle`] wires the tracker, archive, engine, scheduler and
//! navigator to one host and one store, and routes inbound [`Command`]s.
//! Host tab events are fire-and-forget: failures are logged and the event is
//! dropped. User commands return their result.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tabkeep_core::{Clock, LifecycleError, SpaceId, TabGroup, TabId};
use tabkeep_settings::{SharedSettings, TabkeepSettings};
use tabkeep_store::{ActivityTracker, ArchiveStore, ArchivedTabEntry, KvStore};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::engine::{IdleArchivalEngine, SweepReport};
use crate::events::{EventBus, LifecycleEvent};
use crate::host::{HostError, SpaceRegistry, TabHost};
use crate::navigator::TabCycleNavigator;
use crate::scheduler::{ArchiveScheduler, SchedulerState};

/// Load state carried by a tab-updated event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LoadStatus {
    /// Navigation in progress.
    Loading,
    /// Page finished loading.
    Complete,
}

/// What changed in a tab-updated event. `None` means unchanged.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TabChange {
    /// New load status.
    pub status: Option<LoadStatus>,
    /// New audible state.
    pub audible: Option<bool>,
}

impl TabChange {
    /// Whether the change counts as user-visible activity.
    pub fn is_activity(&self) -> bool {
        self.status == Some(LoadStatus::Complete) || self.audible.is_some()
    }
}

/// Inbound command from the host or the UI.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Command {
    /// A tab came to the foreground.
    TabActivated {
        /// The tab.
        tab_id: TabId,
    },
    /// A tab's state changed.
    TabUpdated {
        /// The tab.
        tab_id: TabId,
        /// What changed.
        #[serde(default)]
        change: TabChange,
        /// Whether the tab is currently active.
        #[serde(default)]
        active: bool,
        /// Whether the tab is currently audible.
        #[serde(default)]
        audible: bool,
    },
    /// A tab was closed.
    TabRemoved {
        /// The tab.
        tab_id: TabId,
    },
    /// Settings were replaced; re-arm the sweep timer.
    SettingsChanged,
    /// Step the cycling gesture.
    CycleToNextTab,
    /// Run a sweep now.
    SweepNow,
    /// Archive and close one tab.
    ArchiveTab {
        /// The tab.
        tab_id: TabId,
    },
    /// Reopen an archived tab and drop its entry.
    RestoreArchived {
        /// Archived URL.
        url: String,
        /// Space it was archived from.
        space_id: SpaceId,
    },
}

/// Result of [`TabLifecycle::handle`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Event absorbed.
    Done,
    /// Timer re-armed.
    Rearmed(SchedulerState),
    /// Cycling step; the tab asked to activate, if any.
    Cycled(Option<TabId>),
    /// Sweep finished.
    Swept(SweepReport),
    /// Tab archived; `None` when its `(url, space)` was already archived.
    Archived(Option<ArchivedTabEntry>),
    /// Archived tab reopened as this tab.
    Restored(TabId),
}

/// The tab activity and lifecycle core.
pub struct TabLifecycle {
    tabs: Arc<dyn TabHost>,
    settings: SharedSettings,
    tracker: ActivityTracker,
    archive: ArchiveStore,
    engine: Arc<IdleArchivalEngine>,
    scheduler: ArchiveScheduler,
    navigator: TabCycleNavigator,
    events: EventBus,
}

impl TabLifecycle {
    /// Wire every component to `tabs`, `spaces` and `store`.
    ///
    /// Archive capacity and cycling limits are fixed here; the idle window
    /// and the enable switch are read live from `settings`.
    pub fn new(
        tabs: Arc<dyn TabHost>,
        spaces: Arc<dyn SpaceRegistry>,
        store: Arc<dyn KvStore>,
        settings: SharedSettings,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let events = EventBus::default();
        let tracker = ActivityTracker::new(Arc::clone(&store), Arc::clone(&clock));
        let archive =
            ArchiveStore::with_capacity(store, Arc::clone(&clock), settings.archive_capacity());
        let engine = Arc::new(IdleArchivalEngine::new(
            Arc::clone(&tabs),
            spaces,
            tracker.clone(),
            archive.clone(),
            settings.clone(),
            clock,
            events.clone(),
        ));
        let cycle = settings.cycle();
        let navigator = TabCycleNavigator::with_limits(
            Arc::clone(&tabs),
            cycle.history_size,
            cycle.session_timeout(),
        );
        let scheduler = ArchiveScheduler::new(Arc::clone(&engine), settings.clone());
        Self {
            tabs,
            settings,
            tracker,
            archive,
            engine,
            scheduler,
            navigator,
            events,
        }
    }

    /// Arm the sweep timer from current settings. Call once at startup.
    pub fn start(&self) -> SchedulerState {
        self.scheduler.rearm()
    }

    /// Stop the sweep timer.
    pub fn shutdown(&self) {
        self.scheduler.shutdown();
    }

    /// Subscribe to lifecycle notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.events.subscribe()
    }

    /// Activity store.
    pub fn tracker(&self) -> &ActivityTracker {
        &self.tracker
    }

    /// Archive store.
    pub fn archive(&self) -> &ArchiveStore {
        &self.archive
    }

    /// Cycling navigator.
    pub fn navigator(&self) -> &TabCycleNavigator {
        &self.navigator
    }

    /// Timer state.
    pub fn scheduler_state(&self) -> SchedulerState {
        self.scheduler.state()
    }

    /// Route one inbound command.
    pub async fn handle(&self, command: Command) -> Result<CommandOutcome, LifecycleError> {
        match command {
            Command::TabActivated { tab_id } => {
                self.on_tab_activated(tab_id).await;
                Ok(CommandOutcome::Done)
            }
            Command::TabUpdated {
                tab_id,
                change,
                active,
                audible,
            } => {
                self.on_tab_updated(tab_id, change, active, audible).await;
                Ok(CommandOutcome::Done)
            }
            Command::TabRemoved { tab_id } => {
                self.on_tab_removed(tab_id).await;
                Ok(CommandOutcome::Done)
            }
            Command::SettingsChanged => Ok(CommandOutcome::Rearmed(self.settings_changed())),
            Command::CycleToNextTab => Ok(CommandOutcome::Cycled(self.cycle_next().await)),
            Command::SweepNow => Ok(CommandOutcome::Swept(self.engine.sweep().await)),
            Command::ArchiveTab { tab_id } => {
                self.archive_tab(tab_id).await.map(CommandOutcome::Archived)
            }
            Command::RestoreArchived { url, space_id } => self
                .restore_archived(&url, space_id)
                .await
                .map(CommandOutcome::Restored),
        }
    }

    /// Foreground change: refresh activity and push onto the MRU ring.
    pub async fn on_tab_activated(&self, tab_id: TabId) {
        if let Err(e) = self.tracker.record_activity(tab_id).await {
            warn!(tab_id = %tab_id, error = %e, "recording activation failed");
        }
        self.navigator.record_activation(tab_id).await;
    }

    /// Load-complete or audible change on an active or audible tab counts
    /// as activity.
    pub async fn on_tab_updated(&self, tab_id: TabId, change: TabChange, active: bool, audible: bool) {
        if !change.is_activity() || !(active || audible) {
            return;
        }
        if let Err(e) = self.tracker.record_activity(tab_id).await {
            warn!(tab_id = %tab_id, error = %e, "recording tab update failed");
        }
    }

    /// Tab closed: forget its activity and drop it from the MRU ring.
    pub async fn on_tab_removed(&self, tab_id: TabId) {
        if let Err(e) = self.tracker.clear_activity(tab_id).await {
            warn!(tab_id = %tab_id, error = %e, "clearing removed tab failed");
        }
        self.navigator.forget(tab_id).await;
    }

    /// Re-arm the sweep timer from the current settings.
    pub fn settings_changed(&self) -> SchedulerState {
        self.scheduler.rearm()
    }

    /// Swap in new settings and re-arm. Archive capacity and cycling limits
    /// keep the values they were built with.
    pub fn apply_settings(&self, settings: TabkeepSettings) -> SchedulerState {
        self.settings.replace(settings);
        self.settings_changed()
    }

    /// Step the cycling gesture.
    pub async fn cycle_next(&self) -> Option<TabId> {
        self.navigator.cycle_next().await
    }

    /// Archive one tab into its own space and close it.
    pub async fn archive_tab(
        &self,
        tab_id: TabId,
    ) -> Result<Option<ArchivedTabEntry>, LifecycleError> {
        let tab = match self.tabs.get_tab(tab_id).await {
            Ok(Some(tab)) => tab,
            Ok(None) | Err(HostError::TabNotFound(_)) => {
                debug!(tab_id = %tab_id, "tab to archive is gone, clearing its state");
                self.on_tab_removed(tab_id).await;
                return Err(LifecycleError::StaleReference(format!("tab {tab_id}")));
            }
            Err(e) => return Err(e.into()),
        };
        let space_id = tab.group.space_id().ok_or_else(|| {
            LifecycleError::InvalidData(format!("tab {tab_id} is not in a space"))
        })?;
        self.engine.archive_and_close(&tab, space_id).await
    }

    /// Reopen an archived tab in its space, then drop the archive entry.
    ///
    /// The entry is removed only after the host created the tab.
    pub async fn restore_archived(
        &self,
        url: &str,
        space_id: SpaceId,
    ) -> Result<TabId, LifecycleError> {
        if self.archive.find(url, space_id).await?.is_none() {
            return Err(LifecycleError::StaleReference(format!(
                "{url} is not archived in space {space_id}"
            )));
        }

        let tab_id = self
            .tabs
            .create_tab(url, TabGroup::Grouped(space_id), true)
            .await?;
        if !self.archive.remove(url, space_id).await? {
            debug!(url, space_id = %space_id, "archive entry already gone after restore");
        }
        info!(tab_id = %tab_id, space_id = %space_id, url, "archived tab restored");
        self.events.emit(LifecycleEvent::ArchiveRestored {
            url: url.to_string(),
            space_id,
            tab_id,
        });
        Ok(tab_id)
    }
}

impl std::fmt::Debug for TabLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TabLifecycle")
            .field("engine", &self.engine)
            .field("scheduler", &self.scheduler)
            .finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
