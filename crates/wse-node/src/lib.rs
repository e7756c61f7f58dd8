//! # WS-Eventing Node
//!
//! Wires an event source and a logging event sink together over the
//! in-memory transport.
//!
//! - `config` - TOML configuration (`[source]`, `[sink]`, `[telemetry]`, `[heartbeat]`)
//! - `runtime` - startup and graceful shutdown
//! - `callback` - the sink's logging callback

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod callback;
pub mod config;
pub mod runtime;

pub use callback::LoggingCallback;
pub use config::{load_config, NodeConfig, NodeConfigError};
pub use runtime::NodeRuntime;
