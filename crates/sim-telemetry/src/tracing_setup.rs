//! `tracing` subscriber setup.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{TelemetryConfig, TelemetryError};

/// Guard returned by [`init_tracing`]. Holding it keeps the subscriber
/// installed; there is nothing to flush on drop since there is no remote
/// exporter, but the type exists so call sites read the same way
/// regardless of what the telemetry backend happens to be.
pub struct TracingGuard;

/// Install a process-wide `tracing` subscriber: human-readable or JSON
/// formatted, filtered by `config.log_level` (or `RUST_LOG` if set).
pub fn init_tracing(config: &TelemetryConfig) -> Result<TracingGuard, TelemetryError> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| TelemetryError::TracerInit(e.to_string()))?;

    let registry = tracing_subscriber::registry().with(env_filter);

    let result = if config.json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .try_init()
    };

    // try_init fails if a subscriber is already installed (e.g. a second
    // simulation run in the same process, or under `cargo test`); that is
    // not an error worth propagating.
    if let Err(e) = result {
        tracing::trace!(error = %e, "tracing subscriber already installed");
    }

    Ok(TracingGuard)
}
