//! Package-level constants.

/// Current version of tabkeep (sourced from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Package name.
pub const NAME: &str = "tabkeep";

/// Maximum number of archived tabs retained (FIFO-by-age eviction beyond this).
pub const DEFAULT_ARCHIVE_CAPACITY: usize = 100;

/// Number of distinct tabs remembered for recent-tab cycling.
pub const DEFAULT_CYCLE_HISTORY: usize = 5;

/// Inactivity window that ends a cycling gesture.
pub const DEFAULT_CYCLE_TIMEOUT_MS: u64 = 2000;

/// Default idle threshold before a tab becomes archive-eligible.
pub const DEFAULT_IDLE_MINUTES: u32 = 30;

/// Milliseconds per minute.
pub const MILLIS_PER_MINUTE: i64 = 60_000;
