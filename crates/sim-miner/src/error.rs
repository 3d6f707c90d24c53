use thiserror::Error;

/// Errors raised while driving a miner.
#[derive(Debug, Error)]
pub enum MinerError {
    /// The network layer rejected a send (no outgoing link).
    #[error("network error: {0}")]
    Network(#[from] sim_network::NetworkError),

    /// A persistence write failed against a reachable backend.
    #[error("persistence error: {0}")]
    Persistence(#[from] sim_persistence::PersistenceError),
}
