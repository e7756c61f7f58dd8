//! # Inbound Port - EventSourceApi
//!
//! Operations the hosting application invokes on an event source. Protocol
//! requests from sinks arrive through the transport instead.

use async_trait::async_trait;
use std::time::Duration;

/// Primary API of an event source.
///
/// # Example
///
/// ```rust,ignore
/// use wse_01_event_source::ports::EventSourceApi;
///
/// async fn publish(source: &impl EventSourceApi) {
///     let accepted = source.send_notification("urn:example:Temperature", serde_json::json!(21.5));
///     tracing::info!(accepted, "Published");
///     source.shutdown(std::time::Duration::from_secs(2)).await;
/// }
/// ```
#[async_trait]
pub trait EventSourceApi: Send + Sync {
    /// Offer a notification to every running subscriber of `action`.
    ///
    /// Never blocks on a slow sink. Returns how many queues accepted it.
    fn send_notification(&self, action: &str, payload: serde_json::Value) -> usize;

    /// Send a SubscriptionEnd with `status` to every subscriber that gave an
    /// EndTo address. Returns how many were sent.
    fn subscription_end_to_all(&self, status: &str, reason: Option<&str>) -> usize;

    /// Evict expired and failed subscriptions. Returns the number evicted.
    fn sweep(&self) -> usize;

    /// Number of registered subscriptions.
    fn subscription_count(&self) -> usize;

    /// Tell every subscriber the source is going away, waiting at most
    /// `grace` for those messages, then tear everything down. Idempotent.
    async fn shutdown(&self, grace: Duration);
}
