//! Recent-tab cycling.
//!
//! [`MruHistory`] is a small duplicate-free ring of recently activated tabs,
//! most recent first. A cycling gesture is a burst of
//! [`cycle_next`](TabCycleNavigator::cycle_next) calls: the first call of a
//! burst validates the ring against the host and starts a session at the
//! foreground tab (index 0); every call then steps one position further and
//! asks the host to activate that tab. A session ends after a period of
//! silence, or when no live tab is left in the ring.
//!
//! Each step restarts the inactivity timer. The previous timer task is
//! aborted, and a generation counter makes a timer that already woke up
//! while the state lock was held a no-op.
//!
//! The state lock is never held across a host call: the host may report the
//! resulting activation back through
//! [`record_activation`](TabCycleNavigator::record_activation) before
//! `activate_tab` returns.

use std::sync::Arc;
use std::time::Duration;

use tabkeep_core::TabId;
use tabkeep_core::constants::{DEFAULT_CYCLE_HISTORY, DEFAULT_CYCLE_TIMEOUT_MS};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::host::{HostError, TabHost};

/// Most-recently-used tab ids, front = most recent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MruHistory {
    ids: Vec<TabId>,
    capacity: usize,
}

impl Default for MruHistory {
    fn default() -> Self {
        Self::new(DEFAULT_CYCLE_HISTORY)
    }
}

impl MruHistory {
    /// Create an empty ring holding at most `capacity` ids (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            ids: Vec::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Move `tab_id` to the front, dropping any older occurrence and
    /// anything past capacity.
    pub fn touch(&mut self, tab_id: TabId) {
        self.ids.retain(|id| *id != tab_id);
        self.ids.insert(0, tab_id);
        self.ids.truncate(self.capacity);
    }

    /// Drop `tab_id` if present, returning the position it held.
    pub fn remove(&mut self, tab_id: TabId) -> Option<usize> {
        let position = self.ids.iter().position(|id| *id == tab_id)?;
        let _ = self.ids.remove(position);
        Some(position)
    }

    /// Ids in recency order.
    pub fn as_slice(&self) -> &[TabId] {
        &self.ids
    }

    /// Number of ids held.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the ring is empty.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Maximum number of ids held.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

struct CycleSession {
    index: usize,
    generation: u64,
    timer: Option<JoinHandle<()>>,
}

impl Drop for CycleSession {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

#[derive(Default)]
struct NavState {
    history: MruHistory,
    session: Option<CycleSession>,
    generation: u64,
}

/// Owns the MRU ring and the current cycling session.
#[derive(Clone)]
pub struct TabCycleNavigator {
    tabs: Arc<dyn TabHost>,
    state: Arc<Mutex<NavState>>,
    timeout: Duration,
}

impl TabCycleNavigator {
    /// Navigator with the default ring size and session timeout.
    pub fn new(tabs: Arc<dyn TabHost>) -> Self {
        Self::with_limits(
            tabs,
            DEFAULT_CYCLE_HISTORY,
            Duration::from_millis(DEFAULT_CYCLE_TIMEOUT_MS),
        )
    }

    /// Navigator with an explicit ring size and session timeout.
    pub fn with_limits(tabs: Arc<dyn TabHost>, history_size: usize, timeout: Duration) -> Self {
        let state = NavState {
            history: MruHistory::new(history_size),
            ..NavState::default()
        };
        Self {
            tabs,
            state: Arc::new(Mutex::new(state)),
            timeout,
        }
    }

    /// Note that `tab_id` came to the foreground.
    pub async fn record_activation(&self, tab_id: TabId) {
        if !tab_id.is_valid() {
            return;
        }
        self.state.lock().await.history.touch(tab_id);
    }

    /// Drop a closed tab from the ring.
    pub async fn forget(&self, tab_id: TabId) {
        self.state.lock().await.remove_tab(tab_id);
    }

    /// Current ring contents, most recent first.
    pub async fn history(&self) -> Vec<TabId> {
        self.state.lock().await.history.as_slice().to_vec()
    }

    /// Whether a cycling gesture is in progress.
    pub async fn is_cycling(&self) -> bool {
        self.state.lock().await.session.is_some()
    }

    /// Step to the next tab in the ring and activate it.
    ///
    /// Returns the tab the host was asked to activate, or `None` when the
    /// ring is empty (or emptied by stale entries) or the host refused.
    pub async fn cycle_next(&self) -> Option<TabId> {
        if !self.is_cycling().await {
            self.drop_closed_tabs().await;
        }

        loop {
            let (tab_id, generation) = self.advance().await?;
            match self.tabs.activate_tab(tab_id).await {
                Ok(()) => return Some(tab_id),
                Err(HostError::TabNotFound(_)) => {
                    debug!(tab_id = %tab_id, "recent tab closed, dropping from history");
                    let mut state = self.state.lock().await;
                    state.remove_tab(tab_id);
                    if state.generation != generation {
                        debug!("cycle step superseded by a newer one");
                        return None;
                    }
                }
                Err(e) => {
                    warn!(tab_id = %tab_id, error = %e, "activating recent tab failed");
                    return None;
                }
            }
        }
    }

    /// Move the session one slot forward, starting one if needed, and
    /// restart its timer. Returns the tab now under the cursor.
    async fn advance(&self) -> Option<(TabId, u64)> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        if state.history.is_empty() {
            if state.session.take().is_some() {
                debug!("history emptied, ending cycle session");
            } else {
                debug!("no recent tabs to cycle through");
            }
            return None;
        }

        let current = state.session.as_ref().map_or(0, |s| s.index);
        let index = (current + 1) % state.history.len();
        let tab_id = state.history.as_slice()[index];

        state.generation += 1;
        let generation = state.generation;
        let timer = self.spawn_timeout(generation);
        let session = state.session.get_or_insert_with(|| CycleSession {
            index,
            generation,
            timer: None,
        });
        session.index = index;
        session.generation = generation;
        if let Some(old) = session.timer.replace(timer) {
            old.abort();
        }
        Some((tab_id, generation))
    }

    async fn drop_closed_tabs(&self) {
        let recent = self.history().await;
        let mut closed = Vec::new();
        for tab_id in recent {
            match self.tabs.get_tab(tab_id).await {
                Ok(Some(_)) => {}
                Ok(None) | Err(HostError::TabNotFound(_)) => closed.push(tab_id),
                Err(e) => {
                    warn!(tab_id = %tab_id, error = %e, "could not verify recent tab, keeping it");
                }
            }
        }
        if closed.is_empty() {
            return;
        }

        let mut state = self.state.lock().await;
        for tab_id in closed {
            debug!(tab_id = %tab_id, "recent tab closed, dropping from history");
            state.remove_tab(tab_id);
        }
    }

    fn spawn_timeout(&self, generation: u64) -> JoinHandle<()> {
        let state = Arc::clone(&self.state);
        let timeout = self.timeout;
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            let mut state = state.lock().await;
            if state
                .session
                .as_ref()
                .is_some_and(|s| s.generation == generation)
            {
                if let Some(mut session) = state.session.take() {
                    // This task is the timer; nothing to abort.
                    let _ = session.timer.take();
                }
                debug!("cycle session timed out");
            }
        })
    }
}

impl NavState {
    /// Drop `tab_id` from the ring. A session keeps pointing at the tab it
    /// was on, or at the slot just before a removed current tab so the next
    /// step lands on whatever moved into its place.
    fn remove_tab(&mut self, tab_id: TabId) {
        let Some(position) = self.history.remove(tab_id) else {
            return;
        };
        let len = self.history.len();
        if len == 0 {
            self.session = None;
        } else if let Some(session) = self.session.as_mut() {
            if position <= session.index {
                session.index = session.index.checked_sub(1).unwrap_or(len - 1);
            }
            session.index = session.index.min(len - 1);
        }
    }
}

impl std::fmt::Debug for TabCycleNavigator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TabCycleNavigator")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
