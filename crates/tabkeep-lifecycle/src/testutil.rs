//! In-crate fakes for the host seams.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tabkeep_core::{LifecycleError, ManualClock, SpaceId, TabGroup, TabId};
use tabkeep_settings::{SharedSettings, TabkeepSettings};
use tabkeep_store::{ActivityTracker, ArchiveStore, KvStore, MemoryKvStore, StoreError, UpdateFn};

use crate::host::{HostError, Space, SpaceRegistry, TabHost, TabInfo, TabQuery};

/// Fixed start time for test clocks.
pub const T0: i64 = 1_700_000_000_000;

/// A grouped, idle-looking tab.
pub fn tab(id: i64, url: &str, space: i64) -> TabInfo {
    TabInfo {
        id: TabId::new(id),
        url: url.to_string(),
        title: format!("Tab {id}"),
        pinned: false,
        active: false,
        audible: false,
        group: TabGroup::from_raw(space),
    }
}

/// Settings with auto-archive on at `idle_minutes`.
pub fn enabled_settings(idle_minutes: u32) -> SharedSettings {
    let mut settings = TabkeepSettings::default();
    settings.auto_archive.enabled = true;
    settings.auto_archive.idle_minutes = idle_minutes;
    SharedSettings::new(settings)
}

#[derive(Default)]
struct FakeState {
    tabs: BTreeMap<TabId, TabInfo>,
    foreground: Option<TabId>,
    activated: Vec<TabId>,
    closed: Vec<TabId>,
    created: Vec<(String, TabGroup)>,
    fail_close: HashSet<TabId>,
    fail_activate: HashSet<TabId>,
    vanish_on_get: HashSet<TabId>,
    query_fails: bool,
    query_count: usize,
    next_id: i64,
}

/// In-memory browser. Records every outbound call.
#[derive(Default)]
pub struct FakeTabHost {
    state: Mutex<FakeState>,
}

impl FakeTabHost {
    pub fn new() -> Self {
        let host = Self::default();
        host.state.lock().next_id = 1_000;
        host
    }

    pub fn with_tabs(tabs: impl IntoIterator<Item = TabInfo>) -> Self {
        let host = Self::new();
        for t in tabs {
            host.insert(t);
        }
        host
    }

    pub fn insert(&self, tab: TabInfo) {
        let _ = self.state.lock().tabs.insert(tab.id, tab);
    }

    /// Drop a tab without recording a close, as if the user closed it.
    pub fn vanish(&self, id: i64) {
        let _ = self.state.lock().tabs.remove(&TabId::new(id));
    }

    /// The tab disappears between the query and the re-verification lookup.
    pub fn vanish_on_get(&self, id: i64) {
        let _ = self.state.lock().vanish_on_get.insert(TabId::new(id));
    }

    pub fn fail_close(&self, id: i64) {
        let _ = self.state.lock().fail_close.insert(TabId::new(id));
    }

    pub fn fail_activate(&self, id: i64) {
        let _ = self.state.lock().fail_activate.insert(TabId::new(id));
    }

    pub fn fail_queries(&self) {
        self.state.lock().query_fails = true;
    }

    pub fn contains(&self, id: i64) -> bool {
        self.state.lock().tabs.contains_key(&TabId::new(id))
    }

    pub fn foreground(&self) -> Option<TabId> {
        self.state.lock().foreground
    }

    pub fn activated(&self) -> Vec<TabId> {
        self.state.lock().activated.clone()
    }

    pub fn closed(&self) -> Vec<TabId> {
        self.state.lock().closed.clone()
    }

    pub fn created(&self) -> Vec<(String, TabGroup)> {
        self.state.lock().created.clone()
    }

    pub fn query_count(&self) -> usize {
        self.state.lock().query_count
    }
}

#[async_trait]
impl TabHost for FakeTabHost {
    async fn query_tabs(&self, query: TabQuery) -> Result<Vec<TabInfo>, HostError> {
        let mut state = self.state.lock();
        state.query_count += 1;
        if state.query_fails {
            return Err(HostError::Unavailable("query failed".into()));
        }
        Ok(state
            .tabs
            .values()
            .filter(|t| query.matches(t))
            .cloned()
            .collect())
    }

    async fn get_tab(&self, tab_id: TabId) -> Result<Option<TabInfo>, HostError> {
        let mut state = self.state.lock();
        if state.vanish_on_get.remove(&tab_id) {
            let _ = state.tabs.remove(&tab_id);
        }
        Ok(state.tabs.get(&tab_id).cloned())
    }

    async fn activate_tab(&self, tab_id: TabId) -> Result<(), HostError> {
        let mut state = self.state.lock();
        if state.fail_activate.contains(&tab_id) {
            return Err(HostError::Unavailable("activate failed".into()));
        }
        if !state.tabs.contains_key(&tab_id) {
            return Err(HostError::TabNotFound(tab_id));
        }
        for t in state.tabs.values_mut() {
            t.active = t.id == tab_id;
        }
        state.foreground = Some(tab_id);
        state.activated.push(tab_id);
        Ok(())
    }

    async fn close_tab(&self, tab_id: TabId) -> Result<(), HostError> {
        let mut state = self.state.lock();
        if state.fail_close.contains(&tab_id) {
            return Err(HostError::Unavailable("close failed".into()));
        }
        if state.tabs.remove(&tab_id).is_none() {
            return Err(HostError::TabNotFound(tab_id));
        }
        state.closed.push(tab_id);
        Ok(())
    }

    async fn create_tab(
        &self,
        url: &str,
        group: TabGroup,
        active: bool,
    ) -> Result<TabId, HostError> {
        let mut state = self.state.lock();
        state.next_id += 1;
        let id = TabId::new(state.next_id);
        let _ = state.tabs.insert(
            id,
            TabInfo {
                id,
                url: url.to_string(),
                title: String::new(),
                pinned: false,
                active,
                audible: false,
                group,
            },
        );
        if active {
            state.foreground = Some(id);
        }
        state.created.push((url.to_string(), group));
        Ok(id)
    }
}

/// Fixed space list.
#[derive(Default)]
pub struct StaticSpaces {
    spaces: Mutex<Vec<Space>>,
    fails: Mutex<bool>,
}

impl StaticSpaces {
    pub fn new(spaces: Vec<Space>) -> Self {
        Self {
            spaces: Mutex::new(spaces),
            fails: Mutex::new(false),
        }
    }

    /// One space bookmarking `urls`.
    pub fn bookmarking(space: i64, urls: &[&str]) -> Self {
        Self::new(vec![Space {
            id: Some(SpaceId::new(space)),
            name: format!("Space {space}"),
            bookmarked_urls: urls.iter().map(ToString::to_string).collect(),
        }])
    }

    pub fn fail(&self) {
        *self.fails.lock() = true;
    }
}

#[async_trait]
impl SpaceRegistry for StaticSpaces {
    async fn spaces(&self) -> Result<Vec<Space>, LifecycleError> {
        if *self.fails.lock() {
            return Err(LifecycleError::TransientIo("spaces unavailable".into()));
        }
        Ok(self.spaces.lock().clone())
    }
}

/// Store whose writes start failing on demand.
#[derive(Default)]
pub struct FlakyKvStore {
    inner: MemoryKvStore,
    fail_writes: Mutex<bool>,
}

impl FlakyKvStore {
    pub fn fail_writes(&self, fail: bool) {
        *self.fail_writes.lock() = fail;
    }
}

#[async_trait]
impl KvStore for FlakyKvStore {
    async fn get(&self, key: &str) -> tabkeep_store::Result<Option<Value>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: Value) -> tabkeep_store::Result<()> {
        if *self.fail_writes.lock() {
            return Err(StoreError::Internal("disk full".into()));
        }
        self.inner.set(key, value).await
    }

    async fn update(&self, key: &str, f: UpdateFn) -> tabkeep_store::Result<Option<Value>> {
        if *self.fail_writes.lock() {
            return Err(StoreError::Internal("disk full".into()));
        }
        self.inner.update(key, f).await
    }
}

/// Shared fixtures wired the way the service wires them.
pub struct Fixture {
    pub host: Arc<FakeTabHost>,
    pub spaces: Arc<StaticSpaces>,
    pub clock: Arc<ManualClock>,
    pub tracker: ActivityTracker,
    pub archive: ArchiveStore,
}

impl Fixture {
    pub fn new(host: FakeTabHost, spaces: StaticSpaces) -> Self {
        let kv = Arc::new(MemoryKvStore::new());
        let clock = Arc::new(ManualClock::new(T0));
        Self {
            tracker: ActivityTracker::new(kv.clone(), clock.clone()),
            archive: ArchiveStore::new(kv.clone(), clock.clone()),
            host: Arc::new(host),
            spaces: Arc::new(spaces),
            clock,
        }
    }
}
