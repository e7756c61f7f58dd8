//! Notification callback that logs what the node's own sink receives.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{info, warn};
use wse_02_event_sink::NotificationCallback;

#[derive(Debug, Default)]
pub struct LoggingCallback {
    received: AtomicU64,
}

impl LoggingCallback {
    /// Notifications received so far.
    #[must_use]
    pub fn received(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl NotificationCallback for LoggingCallback {
    async fn on_notification(&self, subscription_id: &str, action: &str, payload: serde_json::Value) {
        let count = self.received.fetch_add(1, Ordering::Relaxed) + 1;
        info!(%subscription_id, %action, %payload, count, "Notification");
    }

    async fn on_subscription_end(&self, subscription_id: &str, status: &str, reason: Option<&str>) {
        warn!(%subscription_id, %status, reason = reason.unwrap_or(""), "Subscription ended by source");
    }
}
