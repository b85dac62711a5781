//! # tabkeep-store
//!
//! Durable state for the tab lifecycle core.
//!
//! - [`KvStore`]: async key-value seam whose [`update`](KvStore::update)
//!   runs a read-modify-write atomically per key. Every write to shared
//!   durable state goes through it, so concurrent updates can't be lost.
//! - [`MemoryKvStore`] / [`SqliteKvStore`]: the two backends.
//! - [`ActivityTracker`]: `tabId → lastActiveMillis` map.
//! - [`ArchiveStore`]: capacity-bounded, deduplicated archived-tab list.

#![deny(unsafe_code)]

pub mod activity;
pub mod archive;
pub mod errors;
pub mod keys;
pub mod kv;
pub mod memory;
pub mod sqlite;

pub use activity::{ActivitySnapshot, ActivityTracker};
pub use archive::{AddOutcome, ArchiveStore, ArchivedTabEntry, NewArchivedTab};
pub use errors::{Result, StoreError};
pub use kv::{KvStore, UpdateFn, get_json, update_json};
pub use memory::MemoryKvStore;
pub use sqlite::SqliteKvStore;
