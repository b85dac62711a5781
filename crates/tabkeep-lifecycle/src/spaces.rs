//! [`SpaceRegistry`] backed by the sidebar's persisted space list.
//!
//! The sidebar stores its spaces under the `spaces` key. Each space carries
//! a `spaceBookmarks` array whose items are either bare URL strings or
//! objects with a `url` field; older records also hold raw tab ids. Only the
//! URLs matter here, anything else is skipped.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::IgnoredAny;
use tabkeep_core::{LifecycleError, SpaceId};
use tabkeep_store::{KvStore, get_json, keys};

use crate::host::{Space, SpaceRegistry};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct StoredSpace {
    id: Option<i64>,
    name: String,
    space_bookmarks: Vec<BookmarkRef>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BookmarkRef {
    Url(String),
    Object { url: Option<String> },
    #[allow(dead_code)]
    Other(IgnoredAny),
}

impl BookmarkRef {
    fn into_url(self) -> Option<String> {
        match self {
            Self::Url(url) | Self::Object { url: Some(url) } if !url.is_empty() => Some(url),
            _ => None,
        }
    }
}

impl From<StoredSpace> for Space {
    fn from(stored: StoredSpace) -> Self {
        Self {
            id: stored.id.map(SpaceId::new),
            name: stored.name,
            bookmarked_urls: stored
                .space_bookmarks
                .into_iter()
                .filter_map(BookmarkRef::into_url)
                .collect(),
        }
    }
}

/// Reads spaces from the shared [`KvStore`].
#[derive(Clone)]
pub struct StoredSpaceRegistry {
    store: Arc<dyn KvStore>,
}

impl StoredSpaceRegistry {
    /// Wrap a store.
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl SpaceRegistry for StoredSpaceRegistry {
    async fn spaces(&self) -> Result<Vec<Space>, LifecycleError> {
        let stored: Vec<StoredSpace> = get_json(self.store.as_ref(), keys::SPACES).await?;
        Ok(stored.into_iter().map(Space::from).collect())
    }
}

impl std::fmt::Debug for StoredSpaceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredSpaceRegistry").finish_non_exhaustive()
    }
}
