//! Telemetry configuration from environment variables or a config file section.

use serde::{Deserialize, Serialize};
use std::env;

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Service name attached to every log line
    pub service_name: String,

    /// Log level filter (trace, debug, info, warn, error) used when `RUST_LOG` is unset
    pub log_level: String,

    /// Whether to enable console output
    pub console_output: bool,

    /// Whether to emit JSON formatted logs
    pub json_logs: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "ws-eventing".to_string(),
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `WSE_SERVICE_NAME`: Service name (default: ws-eventing)
    /// - `WSE_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `WSE_CONSOLE_OUTPUT`: Enable console output (default: true)
    /// - `WSE_JSON_LOGS`: Enable JSON logs (default: false)
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply environment overrides on top of `self` (e.g. values from a file).
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        Self {
            service_name: env::var("WSE_SERVICE_NAME").unwrap_or(self.service_name),

            log_level: env::var("WSE_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or(self.log_level),

            console_output: env::var("WSE_CONSOLE_OUTPUT")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(self.console_output),

            json_logs: env::var("WSE_JSON_LOGS")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(self.json_logs),
        }
    }
}
