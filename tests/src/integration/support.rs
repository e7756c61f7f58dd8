//! Shared fixtures: one transport carrying an event source and an event sink.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use wse_01_event_source::{EventSource, EventSourceConfig};
use wse_02_event_sink::{EventSink, EventSinkConfig, NotificationCallback};
use wse_transport::InMemoryTransport;

pub const TEMPERATURE: &str = "http://example.org/sensor/Temperature";
pub const HUMIDITY: &str = "http://example.org/sensor/Humidity";

/// (subscription id, action, payload)
pub type Received = (String, String, serde_json::Value);
/// (subscription id, status, reason)
pub type Ended = (String, String, Option<String>);

/// Records every callback; optionally parks each notification until a permit is released.
#[derive(Default)]
pub struct Recorder {
    pub notifications: Mutex<Vec<Received>>,
    pub ends: Mutex<Vec<Ended>>,
    gate: Option<Arc<Semaphore>>,
}

impl Recorder {
    pub fn gated(gate: Arc<Semaphore>) -> Self {
        Self {
            gate: Some(gate),
            ..Default::default()
        }
    }

    pub fn count(&self) -> usize {
        self.notifications.lock().len()
    }

    pub fn payloads(&self) -> Vec<serde_json::Value> {
        self.notifications
            .lock()
            .iter()
            .map(|(_, _, payload)| payload.clone())
            .collect()
    }

    pub fn ends(&self) -> Vec<Ended> {
        self.ends.lock().clone()
    }
}

#[async_trait]
impl NotificationCallback for Recorder {
    async fn on_notification(&self, subscription_id: &str, action: &str, payload: serde_json::Value) {
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        self.notifications
            .lock()
            .push((subscription_id.to_string(), action.to_string(), payload));
    }

    async fn on_subscription_end(&self, subscription_id: &str, status: &str, reason: Option<&str>) {
        self.ends.lock().push((
            subscription_id.to_string(),
            status.to_string(),
            reason.map(str::to_string),
        ));
    }
}

pub struct Network {
    pub transport: Arc<InMemoryTransport>,
    pub source: Arc<EventSource>,
    pub sink: Arc<EventSink>,
}

impl Network {
    pub fn new() -> Self {
        Self::with_configs(EventSourceConfig::default(), EventSinkConfig::default())
    }

    pub fn with_configs(source_config: EventSourceConfig, sink_config: EventSinkConfig) -> Self {
        let transport = Arc::new(InMemoryTransport::new());
        let source = EventSource::new(source_config, transport.clone()).unwrap();
        source.bind().unwrap();
        let sink = EventSink::new(transport.clone(), sink_config).unwrap();
        Self {
            transport,
            source,
            sink,
        }
    }

    pub fn source_address(&self) -> String {
        self.source.address()
    }
}

pub async fn eventually(description: &str, condition: impl Fn() -> bool) {
    for _ in 0..400 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("timed out waiting for {description}");
}
