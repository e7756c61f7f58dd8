//! # Outbound Port - NotificationCallback
//!
//! Application hook the sink drives when a source pushes to it.

use async_trait::async_trait;

/// Receives what sources push to this sink.
///
/// Calls for one push endpoint never overlap: the next message on the same
/// endpoint is only accepted once the previous call has returned.
#[async_trait]
pub trait NotificationCallback: Send + Sync {
    async fn on_notification(&self, subscription_id: &str, action: &str, payload: serde_json::Value);

    /// The source ended the subscription. The local proxy is already gone.
    async fn on_subscription_end(&self, _subscription_id: &str, _status: &str, _reason: Option<&str>) {}
}
