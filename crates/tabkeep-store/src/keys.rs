//! Durable store keys.

/// Activity map: JSON object `{ "<tabId>": <lastActiveMillis> }`.
pub const TAB_ACTIVITY: &str = "tabLastActivity";

/// Archived tabs: JSON array of entries, newest first.
pub const ARCHIVED_TABS: &str = "archivedTabs";

/// Spaces written by the sidebar: JSON array of `{id, name, spaceBookmarks}`.
pub const SPACES: &str = "spaces";
