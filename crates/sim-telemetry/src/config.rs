//! Telemetry configuration from environment variables.

use std::env;

/// Configuration for structured logging and metrics.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name attached to log lines.
    pub service_name: String,

    /// Log level filter (trace, debug, info, warn, error).
    pub log_level: String,

    /// Whether to emit JSON-formatted logs instead of human-readable ones.
    pub json_logs: bool,

    /// Local port the Prometheus text endpoint would bind, if the caller
    /// chooses to serve `encode_metrics()` over HTTP. The telemetry crate
    /// itself does not open a socket.
    pub metrics_port: u16,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "btcsimulator".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
            metrics_port: 9898,
        }
    }
}

impl TelemetryConfig {
    /// Build a configuration from `SIM_LOG_LEVEL` / `SIM_JSON_LOGS` /
    /// `SIM_METRICS_PORT`, falling back to defaults when unset or unparsable.
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            service_name: default.service_name,
            log_level: env::var("SIM_LOG_LEVEL").unwrap_or(default.log_level),
            json_logs: env::var("SIM_JSON_LOGS")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(default.json_logs),
            metrics_port: env::var("SIM_METRICS_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.metrics_port),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = TelemetryConfig::default();
        assert_eq!(config.service_name, "btcsimulator");
        assert_eq!(config.log_level, "info");
        assert!(!config.json_logs);
    }
}
