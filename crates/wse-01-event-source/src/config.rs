//! Event source configuration with validation.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use wse_types::constants::{DEFAULT_MAX_EXPIRES_SECS, DEFAULT_QUEUE_CAPACITY};

/// Longest lease a source may be configured to grant (ten years).
pub const MAX_LEASE_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// Configuration errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid base address: {0}")]
    InvalidAddress(String),

    #[error("invalid context path (must start with '/'): {0}")]
    InvalidPath(String),

    #[error("max_expires_secs must be within 1..={MAX_LEASE_SECS}, got {0}")]
    InvalidLease(u64),

    #[error("queue_capacity cannot be 0")]
    InvalidCapacity,

    #[error("{0} cannot be 0")]
    InvalidInterval(&'static str),
}

/// Event source configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventSourceConfig {
    /// Base address under which every context of this source is served
    pub base_address: String,
    /// Path of the endpoint accepting Subscribe requests
    pub source_path: String,
    /// Path prefix of the per-subscription manager endpoints
    pub manager_path_prefix: String,
    /// Longest lease granted; also the grant when Expires is absent
    pub max_expires_secs: u64,
    /// Pending notifications per subscription before it is shed
    pub queue_capacity: usize,
    /// Interval of the background sweep
    pub sweep_interval_ms: u64,
    /// Bound on the SubscriptionEnd broadcast at shutdown
    pub shutdown_grace_ms: u64,
    /// Actions this source publishes; empty accepts any action filter
    pub offered_actions: Vec<String>,
}

impl Default for EventSourceConfig {
    fn default() -> Self {
        Self {
            base_address: "http://127.0.0.1:8080".to_string(),
            source_path: "/events".to_string(),
            manager_path_prefix: "/subscriptions".to_string(),
            max_expires_secs: DEFAULT_MAX_EXPIRES_SECS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            sweep_interval_ms: 5_000,
            shutdown_grace_ms: 2_000,
            offered_actions: Vec::new(),
        }
    }
}

impl EventSourceConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.base_address.contains("://") {
            return Err(ConfigError::InvalidAddress(self.base_address.clone()));
        }

        for path in [&self.source_path, &self.manager_path_prefix] {
            if !path.starts_with('/') {
                return Err(ConfigError::InvalidPath(path.clone()));
            }
        }

        if self.max_expires_secs == 0 || self.max_expires_secs > MAX_LEASE_SECS {
            return Err(ConfigError::InvalidLease(self.max_expires_secs));
        }

        if self.queue_capacity == 0 {
            return Err(ConfigError::InvalidCapacity);
        }

        if self.sweep_interval_ms == 0 {
            return Err(ConfigError::InvalidInterval("sweep_interval_ms"));
        }

        Ok(())
    }

    /// Longest grantable lease.
    #[must_use]
    pub fn max_expires(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.max_expires_secs.min(MAX_LEASE_SECS) as i64)
    }

    #[must_use]
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }

    #[must_use]
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }

    /// Context path of one subscription manager.
    #[must_use]
    pub fn manager_path(&self, subscription_id: &str) -> String {
        format!("{}/{}", self.manager_path_prefix, subscription_id)
    }
}
