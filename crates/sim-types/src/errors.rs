//! # Configuration Errors
//!
//! Errors surfaced at driver entry, before a scheduler is ever constructed.
//! Protocol-level inconsistencies (unknown parent, stale fork) are not
//! errors in this system; they are handled by re-enqueue/request as part
//! of normal validation.

use thiserror::Error;

/// Errors in the scenario parameters passed to the driver.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// `alpha + beta` exceeded 1.0, leaving no room for the SPV share.
    #[error("alpha + beta = {sum} exceeds 1.0")]
    SharesExceedOne { sum: f64 },

    /// A hash share was negative.
    #[error("hash share must be non-negative, got {value}")]
    NegativeShare { value: f64 },

    /// Target confirmation depth was zero or negative.
    #[error("target confirmations must be positive, got {k}")]
    NonPositiveConfirmations { k: i64 },

    /// Miner count for the standard scenario was zero.
    #[error("miner count must be at least 1, got {n}")]
    EmptyTopology { n: usize },
}
