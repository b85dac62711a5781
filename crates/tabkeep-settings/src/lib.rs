//! # tabkeep-settings
//!
//! Configuration with layered sources.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`TabkeepSettings::default()`]
//! 2. **User file**: `~/.tabkeep/settings.json` (deep-merged over defaults)
//! 3. **Environment variables**: `TABKEEP_*` overrides (highest priority)
//!
//! The archival engine reads settings through a [`SharedSettings`] handle at
//! the start of every sweep, so edits take effect without a restart.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod shared;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use shared::SharedSettings;
pub use types::*;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
