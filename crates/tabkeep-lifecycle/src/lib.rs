//! # tabkeep-lifecycle
//!
//! The tab activity and lifecycle core.
//!
//! ## Architecture
//!
//! - [`TabHost`] / [`SpaceRegistry`]: seams to the browser and to the
//!   sidebar's space list. The core never talks to either any other way.
//! - [`IdleArchivalEngine`]: one sweep: find idle, unbookmarked, grouped
//!   tabs, archive them and ask the host to close them.
//! - [`ArchiveScheduler`]: recurring timer driving the engine
//!   (`Disabled → Armed → Sweeping → Armed`).
//! - [`TabCycleNavigator`]: MRU ring plus the transient cycling session.
//! - [`TabLifecycle`]: facade that routes inbound [`Command`]s.
//!
//! ## Fail-Silent
//!
//! Host and store failures are logged and abandon only the item at hand.
//! Nothing here stops the event loop or the sweep timer.

#![deny(unsafe_code)]

pub mod engine;
pub mod events;
pub mod host;
pub mod navigator;
pub mod scheduler;
pub mod service;
pub mod spaces;

#[cfg(test)]
pub(crate) mod testutil;

pub use engine::{IdleArchivalEngine, SweepOutcome, SweepReport};
pub use events::{EventBus, LifecycleEvent};
pub use host::{HostError, Space, SpaceRegistry, TabHost, TabInfo, TabQuery, bookmark_exclusion_set};
pub use navigator::{MruHistory, TabCycleNavigator};
pub use scheduler::{ArchiveScheduler, SchedulerState};
pub use service::{Command, CommandOutcome, LoadStatus, TabChange, TabLifecycle};
pub use spaces::StoredSpaceRegistry;
