//! Archived-tab store.
//!
//! A durable list of `{url, name, spaceId, archivedAt}` entries with two
//! invariants that hold whenever [`ArchiveStore::add`] returns:
//!
//! - **Unique key**: no two entries share `(url, spaceId)`. Re-adding an
//!   existing key is a no-op and keeps the original `archivedAt`.
//! - **Bounded size**: at most `capacity` entries. Beyond that the entries
//!   with the smallest `archivedAt` are evicted.
//!
//! The list is kept sorted newest first.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tabkeep_core::constants::DEFAULT_ARCHIVE_CAPACITY;
use tabkeep_core::{Clock, SpaceId};
use tracing::{debug, info};

use crate::errors::{Result, StoreError};
use crate::keys::ARCHIVED_TABS;
use crate::kv::{KvStore, get_json, update_json};

/// One archived tab.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchivedTabEntry {
    /// Page URL.
    pub url: String,
    /// Display name (tab title, or the URL when the title was empty).
    pub name: String,
    /// Space the tab was archived from.
    pub space_id: SpaceId,
    /// When the entry was created, epoch milliseconds.
    pub archived_at: i64,
}

impl ArchivedTabEntry {
    fn same_key(&self, url: &str, space_id: SpaceId) -> bool {
        self.url == url && self.space_id == space_id
    }
}

/// Input to [`ArchiveStore::add`]. Every field is required.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewArchivedTab {
    /// Page URL.
    pub url: String,
    /// Display name.
    pub name: String,
    /// Owning space.
    pub space_id: Option<SpaceId>,
}

impl NewArchivedTab {
    fn validate(&self) -> Result<SpaceId> {
        if self.url.trim().is_empty() {
            return Err(StoreError::InvalidData("archived tab has no url".into()));
        }
        if self.name.trim().is_empty() {
            return Err(StoreError::InvalidData(format!(
                "archived tab {} has no name",
                self.url
            )));
        }
        self.space_id.ok_or_else(|| {
            StoreError::InvalidData(format!("archived tab {} has no space", self.url))
        })
    }
}

/// Result of [`ArchiveStore::add`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AddOutcome {
    /// A new entry was stored. `evicted` lists entries dropped to stay within capacity.
    Added {
        /// The stored entry.
        entry: ArchivedTabEntry,
        /// Oldest entries removed by the capacity limit.
        evicted: Vec<ArchivedTabEntry>,
    },
    /// An entry with the same `(url, spaceId)` already existed; nothing changed.
    AlreadyArchived,
}

/// Capacity-bounded, deduplicated archive.
#[derive(Clone)]
pub struct ArchiveStore {
    store: Arc<dyn KvStore>,
    clock: Arc<dyn Clock>,
    capacity: usize,
}

impl ArchiveStore {
    /// Create an archive with the default capacity.
    pub fn new(store: Arc<dyn KvStore>, clock: Arc<dyn Clock>) -> Self {
        Self::with_capacity(store, clock, DEFAULT_ARCHIVE_CAPACITY)
    }

    /// Create an archive holding at most `capacity` entries (minimum 1).
    pub fn with_capacity(store: Arc<dyn KvStore>, clock: Arc<dyn Clock>, capacity: usize) -> Self {
        Self {
            store,
            clock,
            capacity: capacity.max(1),
        }
    }

    /// Configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Archive a tab.
    ///
    /// Missing fields fail with [`StoreError::InvalidData`] before anything
    /// is read or written.
    pub async fn add(&self, tab: NewArchivedTab) -> Result<AddOutcome> {
        let space_id = tab.validate()?;
        let now = self.clock.now_millis();
        let capacity = self.capacity;

        let outcome = update_json(
            self.store.as_ref(),
            ARCHIVED_TABS,
            move |entries: &mut Vec<ArchivedTabEntry>| {
                if entries.iter().any(|e| e.same_key(&tab.url, space_id)) {
                    return Ok(AddOutcome::AlreadyArchived);
                }
                let entry = ArchivedTabEntry {
                    url: tab.url,
                    name: tab.name,
                    space_id,
                    archived_at: now,
                };
                entries.insert(0, entry.clone());
                // stable: among equal timestamps the newest insert stays in front
                entries.sort_by(|a, b| b.archived_at.cmp(&a.archived_at));
                let evicted = if entries.len() > capacity {
                    entries.split_off(capacity)
                } else {
                    Vec::new()
                };
                Ok(AddOutcome::Added { entry, evicted })
            },
        )
        .await?;

        match &outcome {
            AddOutcome::Added { entry, evicted } => info!(
                url = %entry.url,
                space_id = %entry.space_id,
                evicted = evicted.len(),
                "tab archived"
            ),
            AddOutcome::AlreadyArchived => debug!("tab already archived"),
        }
        Ok(outcome)
    }

    /// Delete the entry for `(url, space_id)`. Returns whether one existed.
    pub async fn remove(&self, url: &str, space_id: SpaceId) -> Result<bool> {
        let url = url.to_string();
        update_json(
            self.store.as_ref(),
            ARCHIVED_TABS,
            move |entries: &mut Vec<ArchivedTabEntry>| {
                let before = entries.len();
                entries.retain(|e| !e.same_key(&url, space_id));
                Ok(entries.len() != before)
            },
        )
        .await
    }

    /// All entries, newest first.
    pub async fn list(&self) -> Result<Vec<ArchivedTabEntry>> {
        let mut entries: Vec<ArchivedTabEntry> =
            get_json(self.store.as_ref(), ARCHIVED_TABS).await?;
        entries.sort_by(|a, b| b.archived_at.cmp(&a.archived_at));
        Ok(entries)
    }

    /// Look up one entry.
    pub async fn find(&self, url: &str, space_id: SpaceId) -> Result<Option<ArchivedTabEntry>> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .find(|e| e.same_key(url, space_id)))
    }
}

impl std::fmt::Debug for ArchiveStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveStore")
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryKvStore;
    use assert_matches::assert_matches;
    use proptest::prelude::*;
    use tabkeep_core::ManualClock;

    fn archive(capacity: usize) -> (ArchiveStore, Arc<ManualClock>, Arc<MemoryKvStore>) {
        let clock = Arc::new(ManualClock::new(1_000));
        let kv = Arc::new(MemoryKvStore::new());
        let store = ArchiveStore::with_capacity(kv.clone(), clock.clone(), capacity);
        (store, clock, kv)
    }

    fn tab(url: &str, space: i64) -> NewArchivedTab {
        NewArchivedTab {
            url: url.to_string(),
            name: format!("title of {url}"),
            space_id: Some(SpaceId::new(space)),
        }
    }

    #[tokio::test]
    async fn add_stamps_archived_at() {
        let (store, _clock, _kv) = archive(100);
        let outcome = store.add(tab("https://a", 5)).await.unwrap();
        assert_matches!(outcome, AddOutcome::Added { entry, evicted } => {
            assert_eq!(entry.archived_at, 1_000);
            assert_eq!(entry.space_id, SpaceId::new(5));
            assert!(evicted.is_empty());
        });
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn duplicate_key_keeps_first_timestamp() {
        let (store, clock, _kv) = archive(100);
        let _ = store.add(tab("https://a", 5)).await.unwrap();
        clock.advance(60_000);
        let outcome = store.add(tab("https://a", 5)).await.unwrap();
        assert_eq!(outcome, AddOutcome::AlreadyArchived);

        let list = store.list().await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].archived_at, 1_000);
    }

    #[tokio::test]
    async fn same_url_in_other_space_is_distinct() {
        let (store, _clock, _kv) = archive(100);
        let _ = store.add(tab("https://a", 5)).await.unwrap();
        let outcome = store.add(tab("https://a", 6)).await.unwrap();
        assert_matches!(outcome, AddOutcome::Added { .. });
        assert_eq!(store.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn missing_fields_are_rejected_without_write() {
        let (store, _clock, kv) = archive(100);

        let mut no_url = tab("", 5);
        no_url.name = "x".into();
        assert_matches!(store.add(no_url).await, Err(StoreError::InvalidData(_)));

        let mut no_name = tab("https://a", 5);
        no_name.name = String::new();
        assert_matches!(store.add(no_name).await, Err(StoreError::InvalidData(_)));

        let mut no_space = tab("https://a", 5);
        no_space.space_id = None;
        assert_matches!(store.add(no_space).await, Err(StoreError::InvalidData(_)));

        assert!(kv.is_empty());
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let (store, clock, _kv) = archive(100);
        for url in ["https://1", "https://2", "https://3"] {
            let _ = store.add(tab(url, 1)).await.unwrap();
            clock.advance(10);
        }
        let urls: Vec<String> = store.list().await.unwrap().into_iter().map(|e| e.url).collect();
        assert_eq!(urls, vec!["https://3", "https://2", "https://1"]);
    }

    #[tokio::test]
    async fn overflow_evicts_oldest() {
        let (store, clock, _kv) = archive(3);
        for url in ["https://1", "https://2", "https://3"] {
            let _ = store.add(tab(url, 1)).await.unwrap();
            clock.advance(10);
        }
        let outcome = store.add(tab("https://4", 1)).await.unwrap();
        assert_matches!(outcome, AddOutcome::Added { evicted, .. } => {
            assert_eq!(evicted.len(), 1);
            assert_eq!(evicted[0].url, "https://1");
        });
        let urls: Vec<String> = store.list().await.unwrap().into_iter().map(|e| e.url).collect();
        assert_eq!(urls, vec!["https://4", "https://3", "https://2"]);
    }

    #[tokio::test]
    async fn equal_timestamps_keep_the_newest_insert() {
        let (store, _clock, _kv) = archive(2);
        for url in ["https://1", "https://2", "https://3"] {
            let _ = store.add(tab(url, 1)).await.unwrap();
        }
        let urls: Vec<String> = store.list().await.unwrap().into_iter().map(|e| e.url).collect();
        assert_eq!(urls, vec!["https://3", "https://2"]);
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let (store, _clock, _kv) = archive(100);
        let _ = store.add(tab("https://a", 5)).await.unwrap();
        assert!(store.remove("https://a", SpaceId::new(5)).await.unwrap());
        assert!(!store.remove("https://a", SpaceId::new(5)).await.unwrap());
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn remove_only_matches_full_key() {
        let (store, _clock, _kv) = archive(100);
        let _ = store.add(tab("https://a", 5)).await.unwrap();
        assert!(!store.remove("https://a", SpaceId::new(6)).await.unwrap());
        assert!(store.find("https://a", SpaceId::new(5)).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn wire_format_is_camel_case() {
        let (store, _clock, kv) = archive(100);
        let _ = store.add(tab("https://a", 5)).await.unwrap();
        let raw = kv.get(ARCHIVED_TABS).await.unwrap().unwrap();
        assert_eq!(raw[0]["spaceId"], 5);
        assert_eq!(raw[0]["archivedAt"], 1_000);
    }

    proptest! {
        #[test]
        fn keeps_exactly_the_most_recent(stamps in proptest::collection::hash_set(0_i64..1_000_000, 101..160)) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            rt.block_on(async {
                let (store, clock, _kv) = archive(100);
                let stamps: Vec<i64> = stamps.into_iter().collect();
                for (i, ts) in stamps.iter().enumerate() {
                    clock.set(*ts);
                    let _ = store.add(tab(&format!("https://t/{i}"), 1)).await.unwrap();
                }
                let list = store.list().await.unwrap();
                prop_assert_eq!(list.len(), 100);

                let mut expected = stamps.clone();
                expected.sort_unstable_by(|a, b| b.cmp(a));
                expected.truncate(100);
                let kept: Vec<i64> = list.iter().map(|e| e.archived_at).collect();
                prop_assert_eq!(kept, expected);
                Ok::<(), TestCaseError>(())
            })?;
        }
    }
}
