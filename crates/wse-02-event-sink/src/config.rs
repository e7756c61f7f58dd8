//! Event sink configuration with validation.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Upper bound on `auto_renew_lead_ms`: ten years.
pub const MAX_AUTO_RENEW_LEAD_MS: u64 = 10 * 365 * 24 * 60 * 60 * 1_000;

/// Configuration errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid local base address: {0}")]
    InvalidAddress(String),

    #[error("invalid push path prefix (must start with '/'): {0}")]
    InvalidPath(String),

    #[error("{0} cannot be 0")]
    InvalidTimeout(&'static str),

    #[error("auto_renew_lead_ms exceeds {MAX_AUTO_RENEW_LEAD_MS}: {0}")]
    InvalidLead(u64),
}

/// Event sink configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventSinkConfig {
    /// Base address of the sink's own push endpoints
    pub local_base: String,
    /// Path prefix of the push endpoints
    pub push_path_prefix: String,
    /// Bound on every request/response exchange with a source
    pub request_timeout_ms: u64,
    /// Bound on `unsubscribe_all`
    pub shutdown_timeout_ms: u64,
    /// Renew this long before a lease runs out; `None` disables auto-renewal
    pub auto_renew_lead_ms: Option<u64>,
}

impl Default for EventSinkConfig {
    fn default() -> Self {
        Self {
            local_base: "http://127.0.0.1:9090".to_string(),
            push_path_prefix: "/sink".to_string(),
            request_timeout_ms: 5_000,
            shutdown_timeout_ms: 2_000,
            auto_renew_lead_ms: None,
        }
    }
}

impl EventSinkConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.local_base.contains("://") {
            return Err(ConfigError::InvalidAddress(self.local_base.clone()));
        }
        if !self.push_path_prefix.starts_with('/') {
            return Err(ConfigError::InvalidPath(self.push_path_prefix.clone()));
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::InvalidTimeout("request_timeout_ms"));
        }
        if self.shutdown_timeout_ms == 0 {
            return Err(ConfigError::InvalidTimeout("shutdown_timeout_ms"));
        }
        match self.auto_renew_lead_ms {
            Some(0) => return Err(ConfigError::InvalidTimeout("auto_renew_lead_ms")),
            Some(ms) if ms > MAX_AUTO_RENEW_LEAD_MS => return Err(ConfigError::InvalidLead(ms)),
            _ => {}
        }
        Ok(())
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    #[must_use]
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }

    #[must_use]
    pub fn auto_renew_lead(&self) -> Option<chrono::Duration> {
        self.auto_renew_lead_ms
            .map(|ms| chrono::Duration::milliseconds(i64::try_from(ms).unwrap_or(i64::MAX)))
    }
}
