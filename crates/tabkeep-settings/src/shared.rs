//! Live settings handle.
//!
//! The options UI writes new settings, then sends "settings changed". Readers
//! hold a cloned [`SharedSettings`] and always see the latest value.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::types::{AutoArchiveSettings, CycleSettings, TabkeepSettings};

/// Cloneable, thread-safe handle to the current settings.
#[derive(Clone, Debug, Default)]
pub struct SharedSettings {
    inner: Arc<RwLock<TabkeepSettings>>,
}

impl SharedSettings {
    /// Wrap an initial settings value.
    #[must_use]
    pub fn new(settings: TabkeepSettings) -> Self {
        Self {
            inner: Arc::new(RwLock::new(settings)),
        }
    }

    /// Current auto-archive settings.
    pub fn auto_archive(&self) -> AutoArchiveSettings {
        self.inner.read().auto_archive
    }

    /// Current cycling settings.
    pub fn cycle(&self) -> CycleSettings {
        self.inner.read().cycle
    }

    /// Current archive capacity.
    pub fn archive_capacity(&self) -> usize {
        self.inner.read().archive.capacity
    }

    /// Replace the whole settings tree.
    pub fn replace(&self, settings: TabkeepSettings) {
        *self.inner.write() = settings;
    }

    /// Apply an in-place edit.
    pub fn update(&self, f: impl FnOnce(&mut TabkeepSettings)) {
        f(&mut self.inner.write());
    }
}
