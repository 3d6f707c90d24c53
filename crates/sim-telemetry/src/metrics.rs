//! Prometheus metrics for simulation runs.

use lazy_static::lazy_static;
use prometheus::{Counter, CounterVec, Encoder, Opts, Registry, TextEncoder};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry for this process.
    pub static ref REGISTRY: Registry = Registry::new();

    /// Total blocks mined across all miners.
    pub static ref BLOCKS_MINED: Counter = Counter::new(
        "sim_blocks_mined_total",
        "Total number of blocks mined"
    ).expect("metric creation failed");

    /// Total blocks rejected during validation, by reason.
    pub static ref BLOCKS_REJECTED: CounterVec = CounterVec::new(
        Opts::new("sim_blocks_rejected_total", "Total blocks rejected during validation"),
        &["reason"]
    ).expect("metric creation failed");

    /// Total attacker race outcomes, by outcome (win/lose).
    pub static ref ATTACK_OUTCOMES: CounterVec = CounterVec::new(
        Opts::new("sim_attack_outcomes_total", "Attacker race outcomes"),
        &["outcome"]
    ).expect("metric creation failed");

    /// Total chain reorgs observed (a new head strictly taller than the
    /// previous one, from a miner other than the chain's own tip owner).
    pub static ref REORGS: Counter = Counter::new(
        "sim_reorgs_total",
        "Total chain head reorganizations observed"
    ).expect("metric creation failed");
}

/// Handle returned after metrics are registered; holding it keeps the
/// registration alive for the life of the process.
pub struct MetricsHandle;

/// Register every metric with [`REGISTRY`]. Idempotent: calling it more
/// than once from the same process would double-register, so callers
/// should only call it once (the CLI entry point does).
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    REGISTRY
        .register(Box::new(BLOCKS_MINED.clone()))
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    REGISTRY
        .register(Box::new(BLOCKS_REJECTED.clone()))
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    REGISTRY
        .register(Box::new(ATTACK_OUTCOMES.clone()))
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    REGISTRY
        .register(Box::new(REORGS.clone()))
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    Ok(MetricsHandle)
}

/// Record a block produced by a mining activity.
pub fn record_block_mined() {
    BLOCKS_MINED.inc();
}

/// Record a block dropped during validation, labeled by why.
pub fn record_block_rejected(reason: &str) {
    BLOCKS_REJECTED.with_label_values(&[reason]).inc();
}

/// Record an attacker race resolving, labeled `"win"` or `"lose"`.
pub fn record_attack_outcome(outcome: &str) {
    ATTACK_OUTCOMES.with_label_values(&[outcome]).inc();
}

/// Record a chain head reorganization.
pub fn record_reorg() {
    REORGS.inc();
}

/// Render the registry in Prometheus text exposition format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    TextEncoder::new()
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
