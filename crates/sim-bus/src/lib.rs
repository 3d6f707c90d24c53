//! # Simulation Bus
//!
//! A small in-process pub-sub channel, announcing the run's start (the
//! event-name table) and its end (`SIMULATION_ENDED`) on a single
//! well-known topic. Not part of the deterministic core: the scheduler
//! never touches this, only the driver/CLI boundary does.

pub mod events;
pub mod publisher;
pub mod subscriber;

pub use events::{SimEvent, TOPIC};
pub use publisher::{EventPublisher, InMemorySimBus};
pub use subscriber::{Subscription, SubscriptionError};

/// Default channel capacity. A run only ever publishes two events, so this
/// just needs to be comfortably larger than that.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 16;
