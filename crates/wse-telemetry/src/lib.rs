//! # WS-Eventing Telemetry
//!
//! Logging and metrics shared by every crate of the workspace.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use wse_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let config = TelemetryConfig::from_env();
//! init_telemetry(&config).expect("Failed to init telemetry");
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `WSE_SERVICE_NAME` | `ws-eventing` | Service name in logs |
//! | `WSE_LOG_LEVEL` | `info` | Log level filter |
//! | `WSE_JSON_LOGS` | `false` | JSON log lines |

#![cfg_attr(test, allow(clippy::unwrap_used))]

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::{
    encode_metrics, register_metrics, DELIVERY_FAILURES, FAULTS, NOTIFICATIONS_DELIVERED,
    NOTIFICATIONS_OFFERED, QUEUE_OVERFLOWS, SUBSCRIPTIONS_ACTIVE, SUBSCRIPTIONS_TOTAL,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),
}

/// Initialize logging and register metrics.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    register_metrics()?;
    init_logging(config)
}

/// Convenience macro for recording a metric increment.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}
