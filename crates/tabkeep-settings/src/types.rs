//! Settings tree.
//!
//! All types use `camelCase` on the wire and default every missing field,
//! so a partial `settings.json` is always valid.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tabkeep_core::constants::{
    DEFAULT_ARCHIVE_CAPACITY, DEFAULT_CYCLE_HISTORY, DEFAULT_CYCLE_TIMEOUT_MS,
    DEFAULT_IDLE_MINUTES, MILLIS_PER_MINUTE,
};

/// Root settings container.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TabkeepSettings {
    /// Idle-tab auto-archival.
    pub auto_archive: AutoArchiveSettings,
    /// Archive store limits.
    pub archive: ArchiveSettings,
    /// Recent-tab cycling.
    pub cycle: CycleSettings,
    /// Durable storage location.
    pub storage: StorageSettings,
    /// Log output.
    pub logging: LoggingSettings,
}

/// Auto-archive switch and idle threshold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AutoArchiveSettings {
    /// Whether idle tabs are archived automatically.
    pub enabled: bool,
    /// Minutes of inactivity before a tab becomes archive-eligible.
    /// Zero or negative on disk reads as zero, which disables sweeping.
    #[serde(deserialize_with = "clamped_minutes")]
    pub idle_minutes: u32,
}

fn clamped_minutes<'de, D: serde::Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
    let raw = i64::deserialize(d)?;
    Ok(u32::try_from(raw.max(0)).unwrap_or(u32::MAX))
}

impl Default for AutoArchiveSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            idle_minutes: DEFAULT_IDLE_MINUTES,
        }
    }
}

impl AutoArchiveSettings {
    /// Whether a sweep should do anything at all.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.enabled && self.idle_minutes > 0
    }

    /// Idle threshold in milliseconds.
    #[must_use]
    pub fn idle_threshold_millis(&self) -> i64 {
        i64::from(self.idle_minutes) * MILLIS_PER_MINUTE
    }

    /// Sweep timer period: half the idle window, never below one minute.
    ///
    /// Checking at half the window means every idle tab is looked at at
    /// least twice before it has been idle for a full window.
    #[must_use]
    pub fn sweep_period(&self) -> Duration {
        let half = u64::from(self.idle_minutes) * 60_000 / 2;
        Duration::from_millis(half.max(60_000))
    }
}

/// Archive store limits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ArchiveSettings {
    /// Maximum number of archived entries kept.
    pub capacity: usize,
}

impl Default for ArchiveSettings {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_ARCHIVE_CAPACITY,
        }
    }
}

/// Recent-tab cycling.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CycleSettings {
    /// Number of distinct tabs in the MRU ring.
    pub history_size: usize,
    /// Silence after which a cycling gesture ends.
    pub session_timeout_ms: u64,
}

impl Default for CycleSettings {
    fn default() -> Self {
        Self {
            history_size: DEFAULT_CYCLE_HISTORY,
            session_timeout_ms: DEFAULT_CYCLE_TIMEOUT_MS,
        }
    }
}

impl CycleSettings {
    /// Session timeout as a [`Duration`].
    #[must_use]
    pub fn session_timeout(&self) -> Duration {
        Duration::from_millis(self.session_timeout_ms)
    }
}

/// Durable storage location.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StorageSettings {
    /// Path of the `SQLite` state database.
    pub db_path: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
        Self {
            db_path: format!("{home}/.tabkeep/state.db"),
        }
    }
}

/// Log output.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Minimum level (`trace`, `debug`, `info`, `warn`, `error`).
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn archive(enabled: bool, idle_minutes: u32) -> AutoArchiveSettings {
        AutoArchiveSettings {
            enabled,
            idle_minutes,
        }
    }

    #[test]
    fn sweep_period_is_half_idle_window() {
        assert_eq!(archive(true, 30).sweep_period(), Duration::from_secs(15 * 60));
        assert_eq!(archive(true, 15).sweep_period(), Duration::from_secs(450));
    }

    #[test]
    fn sweep_period_never_below_one_minute() {
        assert_eq!(archive(true, 1).sweep_period(), Duration::from_secs(60));
        assert_eq!(archive(true, 2).sweep_period(), Duration::from_secs(60));
        assert_eq!(archive(true, 0).sweep_period(), Duration::from_secs(60));
    }

    #[test]
    fn inactive_when_disabled_or_zero() {
        assert!(!archive(false, 30).is_active());
        assert!(!archive(true, 0).is_active());
        assert!(archive(true, 30).is_active());
    }

    #[test]
    fn idle_threshold_in_millis() {
        assert_eq!(archive(true, 30).idle_threshold_millis(), 1_800_000);
    }

    #[test]
    fn camel_case_wire_format() {
        let json = serde_json::to_value(TabkeepSettings::default()).unwrap();
        assert_eq!(json["autoArchive"]["idleMinutes"], 30);
        assert_eq!(json["cycle"]["sessionTimeoutMs"], 2000);
        assert_eq!(json["cycle"]["historySize"], 5);
    }

    #[test]
    fn negative_idle_minutes_read_as_disabled() {
        let settings: TabkeepSettings = serde_json::from_str(
            r#"{"autoArchive": {"enabled": true, "idleMinutes": -5}, "archive": {"capacity": 7}}"#,
        )
        .unwrap();
        assert_eq!(settings.auto_archive.idle_minutes, 0);
        assert!(!settings.auto_archive.is_active());
        assert_eq!(settings.archive.capacity, 7);
    }

    #[test]
    fn oversized_idle_minutes_saturate() {
        let settings: AutoArchiveSettings =
            serde_json::from_str(r#"{"idleMinutes": 99999999999}"#).unwrap();
        assert_eq!(settings.idle_minutes, u32::MAX);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let settings: TabkeepSettings =
            serde_json::from_str(r#"{"autoArchive": {"enabled": true}}"#).unwrap();
        assert!(settings.auto_archive.enabled);
        assert_eq!(settings.auto_archive.idle_minutes, 30);
        assert_eq!(settings.archive.capacity, 100);
    }
}
