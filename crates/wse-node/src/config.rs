//! Node configuration: one TOML file with a section per component.
//!
//! ```toml
//! [source]
//! max_expires_secs = 600
//! offered_actions = ["urn:wse-node:Heartbeat"]
//!
//! [sink]
//! auto_renew_lead_ms = 5000
//!
//! [telemetry]
//! log_level = "debug"
//!
//! [heartbeat]
//! interval_ms = 1000
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use wse_01_event_source::EventSourceConfig;
use wse_02_event_sink::EventSinkConfig;
use wse_telemetry::TelemetryConfig;

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "WSE_CONFIG";

/// Action of the demo heartbeat notification.
pub const HEARTBEAT_ACTION: &str = "urn:wse-node:Heartbeat";

#[derive(Debug, Error)]
pub enum NodeConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid [source] section: {0}")]
    Source(#[from] wse_01_event_source::ConfigError),

    #[error("invalid [sink] section: {0}")]
    Sink(#[from] wse_02_event_sink::ConfigError),

    #[error("invalid [heartbeat] section: interval_ms cannot be 0")]
    Heartbeat,
}

/// Demo publisher settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeartbeatConfig {
    pub action: String,
    pub interval_ms: u64,
    /// Lease the demo sink asks for; `None` takes the source maximum.
    pub expires_secs: Option<i64>,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            action: HEARTBEAT_ACTION.to_string(),
            interval_ms: 1_000,
            expires_secs: Some(60),
        }
    }
}

/// Complete node configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub source: EventSourceConfig,
    pub sink: EventSinkConfig,
    pub telemetry: TelemetryConfig,
    pub heartbeat: HeartbeatConfig,
}

impl NodeConfig {
    pub fn validate(&self) -> Result<(), NodeConfigError> {
        self.source.validate()?;
        self.sink.validate()?;
        if self.heartbeat.interval_ms == 0 {
            return Err(NodeConfigError::Heartbeat);
        }
        Ok(())
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(path: &Path, text: &str) -> Result<Self, NodeConfigError> {
        let config: Self = toml::from_str(text).map_err(|source| NodeConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, NodeConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| NodeConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(path, &text)
    }
}

/// Load from `$WSE_CONFIG` if set, else defaults. Telemetry environment
/// overrides are applied last.
pub fn load_config() -> Result<NodeConfig, NodeConfigError> {
    let mut config = match std::env::var_os(CONFIG_ENV) {
        Some(path) => NodeConfig::from_file(Path::new(&path))?,
        None => NodeConfig::default(),
    };
    config.telemetry = config.telemetry.with_env_overrides();
    Ok(config)
}
