use thiserror::Error;

/// Errors from the message bus.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// `send_event`/`broadcast` referenced a peer with no outgoing link.
    #[error("no outgoing link from {src} to {dst}")]
    NoLink { src: u64, dst: u64 },
}
