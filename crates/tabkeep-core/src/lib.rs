//! # tabkeep-core
//!
//! Foundation types shared by every tabkeep crate:
//!
//! - **Branded IDs**: [`TabId`] and [`SpaceId`] as integer newtypes assigned by the host
//! - **Group membership**: [`TabGroup`], `Grouped(SpaceId)` or `Ungrouped`
//! - **Clock**: [`Clock`] seam with [`SystemClock`] and [`ManualClock`]
//! - **Errors**: [`LifecycleError`] taxonomy (transient I/O, stale reference, invalid data)
//! - **Logging**: [`logging::init_subscriber`] for the `tracing` subscriber

#![deny(unsafe_code)]

pub mod clock;
pub mod constants;
pub mod errors;
pub mod ids;
pub mod logging;

pub use clock::{Clock, ManualClock, SystemClock};
pub use errors::LifecycleError;
pub use ids::{SpaceId, TabGroup, TabId};
