//! Branded ID newtypes for type safety.
//!
//! Tab and space (tab group) identifiers are opaque integers handed out by
//! the host browser. They are not stable across browser restarts. Each gets
//! its own newtype so a space id can never be passed where a tab id is
//! expected.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw value the host uses for "not in any tab group".
pub const GROUP_ID_NONE: i64 = -1;

macro_rules! branded_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wrap a raw host id.
            #[must_use]
            pub const fn new(raw: i64) -> Self {
                Self(raw)
            }

            /// Return the raw host id.
            #[must_use]
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(raw: i64) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

branded_id! {
    /// Host-assigned identifier of an open tab.
    TabId
}

branded_id! {
    /// Identifier of a space. A space is backed by a host tab group, so this
    /// is the group id of the tabs it holds.
    SpaceId
}

impl TabId {
    /// Whether this id can refer to a real tab (the host uses negative
    /// values as "no tab").
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 >= 0
    }
}

/// Group membership of a tab.
///
/// The host reports a bare integer with a distinguished "none" sentinel;
/// [`TabGroup::from_raw`] turns that into an explicit variant so callers
/// never compare against the magic value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "spaceId")]
pub enum TabGroup {
    /// The tab belongs to the space backed by this group.
    Grouped(SpaceId),
    /// The tab is not in any group.
    Ungrouped,
}

impl TabGroup {
    /// Convert a raw host group id.
    #[must_use]
    pub fn from_raw(raw: i64) -> Self {
        if raw == GROUP_ID_NONE || raw < 0 {
            Self::Ungrouped
        } else {
            Self::Grouped(SpaceId(raw))
        }
    }

    /// The space this tab belongs to, if any.
    #[must_use]
    pub fn space_id(self) -> Option<SpaceId> {
        match self {
            Self::Grouped(id) => Some(id),
            Self::Ungrouped => None,
        }
    }
}
