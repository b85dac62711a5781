//! Recurring sweep timer.
//!
//! `Disabled → Armed → Sweeping → Armed`, back to `Disabled` when
//! auto-archive is switched off. Every [`rearm`](ArchiveScheduler::rearm)
//! cancels the running timer and, if auto-archive is on, starts a new one
//! with the period recomputed from current settings. The first tick comes
//! one full period after arming.
//!
//! Ticks that fall behind (a long sweep, a suspended process) are delayed
//! rather than bunched, so the engine never runs more often than the period.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tabkeep_settings::SharedSettings;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::engine::IdleArchivalEngine;

/// Observable timer state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum SchedulerState {
    /// No timer.
    Disabled,
    /// Timer scheduled.
    Armed {
        /// Time between sweeps.
        #[serde(rename = "periodMs", serialize_with = "as_millis")]
        period: Duration,
    },
    /// A sweep is running.
    Sweeping,
}

fn as_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

struct ArmedTimer {
    period: Duration,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Owns the sweep timer.
pub struct ArchiveScheduler {
    engine: Arc<IdleArchivalEngine>,
    settings: SharedSettings,
    timer: Mutex<Option<ArmedTimer>>,
}

impl ArchiveScheduler {
    /// Create a scheduler with no timer running.
    pub fn new(engine: Arc<IdleArchivalEngine>, settings: SharedSettings) -> Self {
        Self {
            engine,
            settings,
            timer: Mutex::new(None),
        }
    }

    /// Cancel the current timer and arm a new one from current settings.
    ///
    /// Must be called from within a tokio runtime. A sweep already in
    /// progress finishes; only future ticks are affected.
    pub fn rearm(&self) -> SchedulerState {
        let auto_archive = self.settings.auto_archive();
        let mut timer = self.timer.lock();
        if let Some(old) = timer.take() {
            old.cancel.cancel();
        }

        if !auto_archive.is_active() {
            info!("auto-archive disabled, sweep timer cleared");
            return SchedulerState::Disabled;
        }

        let period = auto_archive.sweep_period();
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_timer(
            Arc::clone(&self.engine),
            Instant::now() + period,
            period,
            cancel.clone(),
        ));
        *timer = Some(ArmedTimer {
            period,
            cancel,
            handle,
        });
        let period_ms = u64::try_from(period.as_millis()).unwrap_or(u64::MAX);
        info!(period_ms, "sweep timer armed");
        SchedulerState::Armed { period }
    }

    /// Current state.
    pub fn state(&self) -> SchedulerState {
        match self.timer.lock().as_ref() {
            None => SchedulerState::Disabled,
            Some(_) if self.engine.is_sweeping() => SchedulerState::Sweeping,
            Some(t) if t.handle.is_finished() => SchedulerState::Disabled,
            Some(t) => SchedulerState::Armed { period: t.period },
        }
    }

    /// Stop the timer for good.
    pub fn shutdown(&self) {
        if let Some(old) = self.timer.lock().take() {
            old.cancel.cancel();
            debug!("sweep timer shut down");
        }
    }
}

impl Drop for ArchiveScheduler {
    fn drop(&mut self) {
        if let Some(old) = self.timer.get_mut().take() {
            old.cancel.cancel();
        }
    }
}

impl std::fmt::Debug for ArchiveScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveScheduler")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

async fn run_timer(
    engine: Arc<IdleArchivalEngine>,
    first_tick: Instant,
    period: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = time::interval_at(first_tick, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = ticker.tick() => {
                let report = engine.sweep().await;
                debug!(outcome = ?report.outcome, archived = report.archived.len(), "timer sweep done");
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
