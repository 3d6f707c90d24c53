//! Domain types for the event scheduler: what can be waited on, and what
//! comes back.

mod event;

pub use event::{Event, Fired, InterruptReason, Resumption, SignalId, SignalValue, Time};
