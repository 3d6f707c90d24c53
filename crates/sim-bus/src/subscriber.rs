//! Subscription side of the bus.

use thiserror::Error;
use tokio::sync::broadcast;
use tracing::debug;

use crate::events::SimEvent;

/// Errors from subscription operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// The bus was dropped.
    #[error("event bus closed")]
    Closed,
}

/// A handle for receiving events from an [`crate::InMemorySimBus`].
pub struct Subscription {
    receiver: broadcast::Receiver<SimEvent>,
}

impl Subscription {
    pub(crate) fn new(receiver: broadcast::Receiver<SimEvent>) -> Self {
        Self { receiver }
    }

    /// Non-blocking receive of the next event, if any.
    pub fn try_recv(&mut self) -> Result<Option<SimEvent>, SubscriptionError> {
        loop {
            return match self.receiver.try_recv() {
                Ok(event) => Ok(Some(event)),
                Err(broadcast::error::TryRecvError::Empty) => Ok(None),
                Err(broadcast::error::TryRecvError::Closed) => Err(SubscriptionError::Closed),
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    debug!(lagged = n, "subscriber lagged, skipping");
                    continue;
                }
            };
        }
    }
}
