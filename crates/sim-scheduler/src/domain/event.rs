//! Event vocabulary: what an activity can wait on, and what it gets back.

use sim_types::{Block, Envelope};

/// Virtual simulation time, in seconds. Never read from the wall clock.
pub type Time = f64;

/// Handle to a one-shot signal. Signals are single-use: once fired, the
/// id is retired and a fresh one must be allocated to create a new gate
/// (mirrors the source's "reassign a new event object after succeed()").
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SignalId(pub(crate) u64);

/// The value carried by a fired signal.
#[derive(Clone, Debug)]
pub enum SignalValue {
    /// A pure gate with no payload (e.g. `continue_mining`).
    Unit,
    /// A block payload (e.g. `block_mined`, `block_received`).
    Block(Block),
    /// A network envelope, delivered by `Socket::receive`.
    Envelope(Envelope),
}

impl SignalValue {
    /// Extract the block payload, if any.
    pub fn into_block(self) -> Option<Block> {
        match self {
            SignalValue::Block(b) => Some(b),
            SignalValue::Unit | SignalValue::Envelope(_) => None,
        }
    }

    /// Extract the envelope payload, if any.
    pub fn into_envelope(self) -> Option<Envelope> {
        match self {
            SignalValue::Envelope(e) => Some(e),
            SignalValue::Unit | SignalValue::Block(_) => None,
        }
    }
}

/// An event an activity can suspend on.
#[derive(Clone, Debug)]
pub enum Event {
    /// Fires once `Time` seconds of virtual time have elapsed.
    Timeout(Time),
    /// Fires when the referenced signal is succeeded.
    Signal(SignalId),
    /// Fires the instant any one of its sub-events fires; multiple
    /// sub-events firing at the same tick are all delivered together.
    AnyOf(Vec<Event>),
    /// This activity has nothing further to wait on; it never resumes.
    Halt,
}

/// What fired, handed back to the activity that was waiting on it.
#[derive(Clone, Debug)]
pub enum Fired {
    /// A `Timeout` event elapsed.
    Timeout,
    /// A `Signal` event fired, with its value.
    Signal(SignalId, SignalValue),
    /// One or more sub-events of an `AnyOf` fired in the same tick, paired
    /// with which branch (by index into the original `Vec`) produced them.
    Any(Vec<(usize, Fired)>),
}

/// Why an activity is being interrupted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InterruptReason {
    /// A new block (mined or received) needs to be reconciled with the
    /// chain head, pre-empting whatever the activity was doing.
    NewBlockPending,
}

/// The value delivered to an activity's `resume` call: either its awaited
/// event fired normally, or it was interrupted at its suspension point.
#[derive(Clone, Debug)]
pub enum Resumption {
    /// The event the activity was waiting on fired.
    Fired(Fired),
    /// The activity was interrupted before its awaited event fired.
    Interrupted(InterruptReason),
}
