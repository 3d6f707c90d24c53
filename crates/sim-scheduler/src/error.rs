//! Errors raised by the scheduler itself (as opposed to by activities
//! running on top of it).

use thiserror::Error;

/// Errors from misuse of the scheduler API.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// A signal was waited on or succeeded after it had already fired.
    /// Signals are single-use; a fresh one must be allocated per gate.
    #[error("signal {0:?} already fired; allocate a fresh signal to reuse the gate")]
    SignalAlreadyFired(crate::domain::SignalId),

    /// An operation referenced an activity id that is not registered.
    #[error("no such activity: {0}")]
    UnknownActivity(usize),
}
