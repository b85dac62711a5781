//! Lifecycle notifications.
//!
//! Fan-out of what the core did, for whatever UI or log sink is listening.
//! Sends never block and never fail the operation that produced them.

use serde::Serialize;
use tabkeep_core::{SpaceId, TabId};
use tabkeep_store::ArchivedTabEntry;
use tokio::sync::broadcast;

use crate::engine::SweepReport;

/// Something the lifecycle core did.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum LifecycleEvent {
    /// A tab was recorded in the archive (by a sweep or by request).
    TabArchived {
        /// The tab that was closed.
        tab_id: TabId,
        /// The stored archive entry.
        entry: ArchivedTabEntry,
    },
    /// An archived tab was reopened and its entry removed.
    ArchiveRestored {
        /// Restored URL.
        url: String,
        /// Space it was restored into.
        space_id: SpaceId,
        /// The newly created tab.
        tab_id: TabId,
    },
    /// A sweep finished.
    SweepCompleted {
        /// What the sweep did.
        report: SweepReport,
    },
}

/// Broadcast channel for [`LifecycleEvent`]s.
#[derive(Clone, Debug)]
pub struct EventBus {
    tx: broadcast::Sender<LifecycleEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}

impl EventBus {
    /// Create a bus buffering up to `capacity` events per slow receiver.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Subscribe to future events.
    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.tx.subscribe()
    }

    /// Publish an event. Having no subscribers is fine.
    pub fn emit(&self, event: LifecycleEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!("lifecycle event dropped, no subscribers");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_events() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();
        bus.emit(LifecycleEvent::ArchiveRestored {
            url: "https://a".into(),
            space_id: SpaceId::new(5),
            tab_id: TabId::new(9),
        });
        let event = rx.recv().await.unwrap();
        assert_eq!(
            event,
            LifecycleEvent::ArchiveRestored {
                url: "https://a".into(),
                space_id: SpaceId::new(5),
                tab_id: TabId::new(9),
            }
        );
    }

    #[test]
    fn emit_without_subscribers_is_silent() {
        let bus = EventBus::new(0);
        bus.emit(LifecycleEvent::SweepCompleted {
            report: SweepReport::default(),
        });
    }

    #[test]
    fn event_wire_format() {
        let event = LifecycleEvent::ArchiveRestored {
            url: "https://a".into(),
            space_id: SpaceId::new(5),
            tab_id: TabId::new(9),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "archiveRestored");
        assert_eq!(json["spaceId"], 5);
        assert_eq!(json["tabId"], 9);
    }
}
