//! Publishing side of the bus.

use tokio::sync::broadcast;
use tracing::debug;

use crate::events::SimEvent;
use crate::subscriber::Subscription;
use crate::DEFAULT_CHANNEL_CAPACITY;

/// Publishes [`SimEvent`]s to any subscribers.
///
/// Synchronous: nothing here runs on the scheduler's tick, so there is no
/// reason to make a handful of start/end notifications `async`.
pub trait EventPublisher {
    /// Publish an event. Returns the number of subscribers that received it.
    fn publish(&self, event: SimEvent) -> usize;

    /// Total events published so far.
    fn events_published(&self) -> u64;
}

/// In-memory bus backed by a broadcast channel. One process, one run.
pub struct InMemorySimBus {
    sender: broadcast::Sender<SimEvent>,
    events_published: std::sync::atomic::AtomicU64,
}

impl InMemorySimBus {
    /// New bus with the default channel capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// New bus with a specific channel capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            events_published: std::sync::atomic::AtomicU64::new(0),
        }
    }

    /// Subscribe to every event published on this bus.
    pub fn subscribe(&self) -> Subscription {
        Subscription::new(self.sender.subscribe())
    }
}

impl Default for InMemorySimBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventPublisher for InMemorySimBus {
    fn publish(&self, event: SimEvent) -> usize {
        use std::sync::atomic::Ordering;
        self.events_published.fetch_add(1, Ordering::Relaxed);
        match self.sender.send(event) {
            Ok(n) => {
                debug!(receivers = n, "event published");
                n
            }
            Err(_) => 0,
        }
    }

    fn events_published(&self) -> u64 {
        self.events_published.load(std::sync::atomic::Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_with_no_subscribers_counts_but_drops() {
        let bus = InMemorySimBus::new();
        assert_eq!(bus.publish(SimEvent::SimulationEnded), 0);
        assert_eq!(bus.events_published(), 1);
    }

    #[test]
    fn subscriber_receives_published_event() {
        let bus = InMemorySimBus::new();
        let mut sub = bus.subscribe();
        assert_eq!(bus.publish(SimEvent::SimulationEnded), 1);
        assert!(matches!(sub.try_recv(), Ok(Some(SimEvent::SimulationEnded))));
    }
}
