use thiserror::Error;

/// Errors from a persistence backend.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// The backend could not be reached or constructed at all. The driver
    /// treats this as fatal: the run does not start.
    #[error("persistence backend unreachable: {0}")]
    Unreachable(String),

    /// A record or index write failed against a reachable backend.
    #[error("write to {path} failed: {reason}")]
    WriteFailed { path: String, reason: String },
}
