//! # Node Runtime
//!
//! ## Startup Sequence
//!
//! 1. Create the in-memory transport
//! 2. Create the event source, bind its Subscribe endpoint, start the sweeper
//! 3. Subscribe the node's logging sink to the heartbeat action
//! 4. Start the heartbeat publisher
//!
//! ## Shutdown Sequence
//!
//! 1. Stop the heartbeat publisher
//! 2. `EventSink::unsubscribe_all()` (bounded by `sink.shutdown_timeout_ms`)
//! 3. `EventSource::shutdown(grace)` (bounded by `source.shutdown_grace_ms`)

use crate::callback::LoggingCallback;
use crate::config::NodeConfig;
use anyhow::{Context, Result};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};
use wse_01_event_source::{EventSource, EventSourceApi};
use wse_02_event_sink::EventSink;
use wse_transport::InMemoryTransport;
use wse_types::Expires;

/// An event source and a sink subscribed to it, in one process.
pub struct NodeRuntime {
    config: NodeConfig,
    transport: Arc<InMemoryTransport>,
    source: Arc<EventSource>,
    sink: Arc<EventSink>,
    callback: Arc<LoggingCallback>,
    sweeper: Option<JoinHandle<()>>,
    heartbeat: Option<JoinHandle<()>>,
    shutdown_tx: watch::Sender<bool>,
}

impl NodeRuntime {
    pub fn new(config: NodeConfig) -> Result<Self> {
        config.validate().context("Invalid node configuration")?;

        let transport = Arc::new(InMemoryTransport::new());
        let source = EventSource::new(config.source.clone(), transport.clone())
            .context("Failed to create event source")?;
        let sink = EventSink::new(transport.clone(), config.sink.clone())
            .context("Failed to create event sink")?;
        let (shutdown_tx, _) = watch::channel(false);

        Ok(Self {
            config,
            transport,
            source,
            sink,
            callback: Arc::new(LoggingCallback::default()),
            sweeper: None,
            heartbeat: None,
            shutdown_tx,
        })
    }

    /// Bring everything up. Returns the id of the node's own subscription.
    pub async fn start(&mut self) -> Result<String> {
        let address = self.source.bind().context("Failed to bind event source")?;
        self.sweeper = Some(self.source.spawn_sweeper());

        let heartbeat = &self.config.heartbeat;
        let (subscription_id, granted) = self
            .sink
            .subscribe_actions(
                &address,
                [heartbeat.action.as_str()],
                heartbeat.expires_secs.map(Expires::seconds),
                self.callback.clone(),
            )
            .await
            .context("Failed to subscribe the node sink")?;
        info!(%subscription_id, expires = %granted, "Node sink subscribed");

        self.heartbeat = Some(spawn_heartbeat(
            Arc::clone(&self.source),
            heartbeat.action.clone(),
            Duration::from_millis(heartbeat.interval_ms),
            self.shutdown_tx.subscribe(),
        ));

        info!(
            source = %address,
            action = %heartbeat.action,
            interval_ms = heartbeat.interval_ms,
            "Node running"
        );
        Ok(subscription_id)
    }

    /// Stop publishing, unsubscribe the sink, then shut the source down.
    pub async fn shutdown(&mut self) {
        info!("Initiating graceful shutdown...");
        self.shutdown_tx.send_replace(true);
        if let Some(heartbeat) = self.heartbeat.take() {
            if let Err(e) = heartbeat.await {
                error!("Heartbeat task failed: {}", e);
            }
        }

        let acknowledged = self.sink.unsubscribe_all().await;
        debug!(acknowledged, "Sink unsubscribed");

        self.source.shutdown(self.config.source.shutdown_grace()).await;
        if let Some(sweeper) = self.sweeper.take() {
            sweeper.abort();
        }

        info!(
            notifications = self.callback.received(),
            messages = self.transport.messages_sent(),
            "Shutdown complete"
        );
    }

    #[must_use]
    pub fn source(&self) -> &Arc<EventSource> {
        &self.source
    }

    #[must_use]
    pub fn sink(&self) -> &Arc<EventSink> {
        &self.sink
    }

    #[must_use]
    pub fn callback(&self) -> &LoggingCallback {
        &self.callback
    }
}

/// Publish `action` every `period` until the shutdown signal flips.
fn spawn_heartbeat(
    source: Arc<EventSource>,
    action: String,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        let mut sequence = 0u64;
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    sequence += 1;
                    let payload = serde_json::json!({
                        "sequence": sequence,
                        "timestamp": Utc::now().to_rfc3339(),
                    });
                    let accepted = source.send_notification(&action, payload);
                    debug!(sequence, accepted, "Heartbeat published");
                }
                _ = shutdown.changed() => break,
            }
        }
    })
}
