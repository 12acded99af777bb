//! Best-effort fan-out of registry change notifications.

use ricetrace_core::RegistryEvent;
use tokio::sync::broadcast;

/// Broadcast bus for [`RegistryEvent`]s.
///
/// Delivery is best-effort: publishing with no subscribers is not an
/// error, and a subscriber that lags past the channel capacity observes
/// a `RecvError::Lagged` and re-queries the registry to catch up. All
/// registry state stays derivable through plain queries, so polling
/// remains a correct fallback.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<RegistryEvent>,
}

impl EventBus {
    /// Create a bus with the given buffered capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish an event to current subscribers.
    pub fn publish(&self, event: RegistryEvent) {
        // send only fails when nobody is subscribed; not a failure here.
        let _ = self.tx.send(event);
    }

    /// Subscribe to events published from this point on.
    pub fn subscribe(&self) -> broadcast::Receiver<RegistryEvent> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ricetrace_core::models::{Identity, Role};

    #[tokio::test]
    async fn publish_without_subscribers_is_not_an_error() {
        let bus = EventBus::new(4);
        bus.publish(RegistryEvent::BatchCreated { id: 1 });
    }

    #[tokio::test]
    async fn subscriber_receives_published_events() {
        let bus = EventBus::new(4);
        let mut rx = bus.subscribe();

        bus.publish(RegistryEvent::RoleChanged {
            identity: Identity::new("0xalice"),
            role: Role::Farmer,
            granted: true,
        });

        let event = rx.recv().await.unwrap();
        assert_eq!(
            event,
            RegistryEvent::RoleChanged {
                identity: Identity::new("0xalice"),
                role: Role::Farmer,
                granted: true,
            }
        );
    }

    #[tokio::test]
    async fn late_subscriber_misses_earlier_events() {
        let bus = EventBus::new(4);
        bus.publish(RegistryEvent::BatchCreated { id: 1 });

        let mut rx = bus.subscribe();
        bus.publish(RegistryEvent::BatchCreated { id: 2 });

        assert_eq!(rx.recv().await.unwrap(), RegistryEvent::BatchCreated { id: 2 });
    }
}
