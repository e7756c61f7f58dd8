//! # WS-Eventing Node
//!
//! Runs until Ctrl+C, then unsubscribes its sink and shuts the source down.
//!
//! ## Environment
//!
//! | Variable | Purpose |
//! |----------|---------|
//! | `WSE_CONFIG` | Path of the TOML configuration file |
//! | `WSE_LOG_LEVEL` / `RUST_LOG` | Log filter |
//! | `WSE_JSON_LOGS` | JSON log lines |

use anyhow::{Context, Result};
use tracing::info;
use wse_node::{load_config, NodeRuntime};

#[tokio::main]
async fn main() -> Result<()> {
    let config = load_config().context("Failed to load configuration")?;
    wse_telemetry::init_telemetry(&config.telemetry).context("Failed to initialize telemetry")?;

    let mut runtime = NodeRuntime::new(config)?;
    runtime.start().await?;

    info!("Node is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;

    runtime.shutdown().await;
    Ok(())
}
