//! # Simulation Telemetry
//!
//! Structured logging and Prometheus metrics for the simulator. No remote
//! exporter: runs are short-lived, single-process, and their useful output
//! is the console (or a scraped `/metrics` endpoint an operator wires up
//! themselves), not a trace backend.
//!
//! ## Environment variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SIM_LOG_LEVEL` | `info` | Log level filter (also honors `RUST_LOG`) |
//! | `SIM_JSON_LOGS` | `false` | Emit JSON-formatted logs |
//! | `SIM_METRICS_PORT` | `9898` | Port an operator might serve `/metrics` on |

mod config;
mod metrics;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use metrics::{
    encode_metrics, record_attack_outcome, record_block_mined, record_block_rejected,
    record_reorg, register_metrics, MetricsHandle, ATTACK_OUTCOMES, BLOCKS_MINED,
    BLOCKS_REJECTED, REORGS,
};
pub use tracing_setup::TracingGuard;

use thiserror::Error;

/// Telemetry initialization errors.
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// The `tracing` subscriber could not be built.
    #[error("failed to initialize tracing subscriber: {0}")]
    TracerInit(String),

    /// Prometheus metrics could not be registered or encoded.
    #[error("failed to initialize metrics: {0}")]
    MetricsInit(String),
}

/// Initialize logging and metrics together. Returns a guard that must be
/// held for the lifetime of the process.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let metrics_handle = register_metrics()?;
    let tracing_guard = tracing_setup::init_tracing(&config)?;
    Ok(TelemetryGuard {
        _tracing: tracing_guard,
        _metrics: metrics_handle,
    })
}

/// Guard that keeps telemetry active. Drop to release it.
pub struct TelemetryGuard {
    _tracing: TracingGuard,
    _metrics: MetricsHandle,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_from_env_has_sensible_defaults() {
        let config = TelemetryConfig::default();
        assert_eq!(config.service_name, "btcsimulator");
    }
}
