//! Per-tab last-activity timestamps.
//!
//! Durable map `tabId → lastActiveMillis`, created on a tab's first activity
//! event and deleted when the tab closes. Keys are a best-effort subset of
//! the open tabs: a missed removal event leaves an orphan entry behind,
//! which is harmless since nothing looks it up.
//!
//! Writes never do a bulk read/merge/write from the caller's side. Each one
//! is a single [`update_json`] on the store, so concurrent calls for
//! different tabs can't overwrite each other's entries.

use std::collections::BTreeMap;
use std::sync::Arc;

use tabkeep_core::{Clock, TabId};
use tracing::debug;

use crate::errors::Result;
use crate::keys::TAB_ACTIVITY;
use crate::kv::{KvStore, get_json, update_json};

/// Immutable copy of the activity map as of the last durable write.
pub type ActivitySnapshot = BTreeMap<TabId, i64>;

/// Tracks when each tab was last in use.
#[derive(Clone)]
pub struct ActivityTracker {
    store: Arc<dyn KvStore>,
    clock: Arc<dyn Clock>,
}

impl ActivityTracker {
    /// Create a tracker over `store`.
    pub fn new(store: Arc<dyn KvStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Stamp `tab_id` with the current time. Invalid ids are ignored.
    pub async fn record_activity(&self, tab_id: TabId) -> Result<()> {
        if !tab_id.is_valid() {
            debug!(%tab_id, "ignoring activity for invalid tab id");
            return Ok(());
        }
        let now = self.clock.now_millis();
        update_json(self.store.as_ref(), TAB_ACTIVITY, move |map: &mut ActivitySnapshot| {
            let _ = map.insert(tab_id, now);
            Ok(())
        })
        .await
    }

    /// Forget `tab_id`. Missing entries are fine.
    pub async fn clear_activity(&self, tab_id: TabId) -> Result<()> {
        if !tab_id.is_valid() {
            return Ok(());
        }
        update_json(self.store.as_ref(), TAB_ACTIVITY, move |map: &mut ActivitySnapshot| {
            let _ = map.remove(&tab_id);
            Ok(())
        })
        .await
    }

    /// Copy of the whole map.
    pub async fn snapshot(&self) -> Result<ActivitySnapshot> {
        get_json(self.store.as_ref(), TAB_ACTIVITY).await
    }

    /// Last recorded activity for one tab.
    pub async fn last_active(&self, tab_id: TabId) -> Result<Option<i64>> {
        Ok(self.snapshot().await?.get(&tab_id).copied())
    }
}

impl std::fmt::Debug for ActivityTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivityTracker").finish_non_exhaustive()
    }
}
