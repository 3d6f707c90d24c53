use thiserror::Error;

/// Errors surfaced at driver entry.
#[derive(Debug, Error)]
pub enum DriverError {
    /// Scenario parameters were invalid; nothing ran.
    #[error("invalid scenario configuration: {0}")]
    Config(#[from] sim_types::ConfigError),

    /// The configured persistence backend could not be constructed.
    #[error("persistence backend unreachable: {0}")]
    Persistence(#[from] sim_persistence::PersistenceError),
}
