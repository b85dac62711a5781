//! Host seams.
//!
//! [`TabHost`] is the browser's tab API as seen by the core: query by
//! predicate, look up one tab, and the three outbound requests (activate,
//! close, create). [`SpaceRegistry`] exposes the user's spaces and the URLs
//! bookmarked in each.

use std::collections::HashSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tabkeep_core::{LifecycleError, SpaceId, TabGroup, TabId};
use thiserror::Error;

/// Live state of one tab as reported by the host.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabInfo {
    /// Host tab id.
    pub id: TabId,
    /// Current URL.
    pub url: String,
    /// Current title (may be empty while loading).
    #[serde(default)]
    pub title: String,
    /// Pinned tabs are never archived.
    #[serde(default)]
    pub pinned: bool,
    /// Whether this is the foreground tab of its window.
    #[serde(default)]
    pub active: bool,
    /// Whether the tab is playing sound.
    #[serde(default)]
    pub audible: bool,
    /// Group (space) membership.
    pub group: TabGroup,
}

impl TabInfo {
    /// Name used when archiving: the title, or the URL if the title is blank.
    pub fn display_name(&self) -> &str {
        if self.title.trim().is_empty() {
            &self.url
        } else {
            &self.title
        }
    }

    /// Active or audible tabs count as in use.
    pub fn in_use(&self) -> bool {
        self.active || self.audible
    }
}

/// Tab filter. `None` fields match anything.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TabQuery {
    /// Match on pinned state.
    pub pinned: Option<bool>,
    /// Match on active state.
    pub active: Option<bool>,
    /// Match on audible state.
    pub audible: Option<bool>,
}

impl TabQuery {
    /// Every non-pinned tab across all windows.
    #[must_use]
    pub fn unpinned() -> Self {
        Self {
            pinned: Some(false),
            ..Self::default()
        }
    }

    /// Whether `tab` satisfies the filter.
    pub fn matches(&self, tab: &TabInfo) -> bool {
        self.pinned.is_none_or(|p| p == tab.pinned)
            && self.active.is_none_or(|a| a == tab.active)
            && self.audible.is_none_or(|a| a == tab.audible)
    }
}

/// Failure of a host call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    /// The tab was closed before the call reached it.
    #[error("tab {0} not found")]
    TabNotFound(TabId),
    /// The host API call failed for any other reason.
    #[error("host call failed: {0}")]
    Unavailable(String),
}

impl From<HostError> for LifecycleError {
    fn from(err: HostError) -> Self {
        match err {
            HostError::TabNotFound(id) => Self::StaleReference(format!("tab {id}")),
            HostError::Unavailable(msg) => Self::TransientIo(msg),
        }
    }
}

/// Browser tab API.
#[async_trait]
pub trait TabHost: Send + Sync {
    /// All tabs matching `query`, across windows.
    async fn query_tabs(&self, query: TabQuery) -> Result<Vec<TabInfo>, HostError>;

    /// Current state of one tab; `Ok(None)` when it no longer exists.
    async fn get_tab(&self, tab_id: TabId) -> Result<Option<TabInfo>, HostError>;

    /// Bring a tab to the foreground.
    async fn activate_tab(&self, tab_id: TabId) -> Result<(), HostError>;

    /// Close a tab.
    async fn close_tab(&self, tab_id: TabId) -> Result<(), HostError>;

    /// Open `url` in a new tab placed in `group`.
    async fn create_tab(&self, url: &str, group: TabGroup, active: bool)
    -> Result<TabId, HostError>;
}

/// A user space and the URLs bookmarked in it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Space {
    /// Backing group id, when the space currently has one.
    pub id: Option<SpaceId>,
    /// Display name.
    pub name: String,
    /// Bookmarked URLs.
    pub bookmarked_urls: Vec<String>,
}

/// Read-only view of the user's spaces.
#[async_trait]
pub trait SpaceRegistry: Send + Sync {
    /// All spaces.
    async fn spaces(&self) -> Result<Vec<Space>, LifecycleError>;
}

/// URLs bookmarked in any space. Tabs showing one of these are never archived.
pub async fn bookmark_exclusion_set(
    registry: &dyn SpaceRegistry,
) -> Result<HashSet<String>, LifecycleError> {
    Ok(registry
        .spaces()
        .await?
        .into_iter()
        .flat_map(|space| space.bookmarked_urls)
        .collect())
}
