//! Typed event channels, spec §6 ("event channels produced") / §9
//! ("reactive event channels ... translate to typed message queues with a
//! single consumer per event type"). A thin wrapper over `tokio::sync::
//! broadcast` — the teacher's own event-bus plumbing for multi-consumer
//! fan-out — rather than a bespoke observer-pattern trait.

use tokio::sync::broadcast;

/// A single-producer, multi-consumer channel for one event type. Bounded:
/// a slow consumer that falls behind loses the oldest events rather than
/// blocking the producer (spec §5 backpressure is enforced at the MPSC
/// producer side instead, see `mst`/`simulator`).
pub struct EventBus<T: Clone> {
    sender: broadcast::Sender<T>,
}

impl<T: Clone> EventBus<T> {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<T> {
        self.sender.subscribe()
    }

    /// Publishes `event`. Returns the number of active subscribers that
    /// received it; `0` is not an error (nobody's listening yet).
    pub fn publish(&self, event: T) -> usize {
        self.sender.send(event).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscriber_receives_published_event() {
        let bus: EventBus<u32> = EventBus::new(8);
        let mut rx = bus.subscribe();
        bus.publish(42);
        assert_eq!(rx.recv().await.unwrap(), 42);
    }

    #[tokio::test]
    async fn publish_with_no_subscribers_is_not_an_error() {
        let bus: EventBus<u32> = EventBus::new(8);
        assert_eq!(bus.publish(1), 0);
    }
}
