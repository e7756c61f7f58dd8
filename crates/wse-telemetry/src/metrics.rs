//! Prometheus metrics for the eventing engine.
//!
//! All metrics follow the naming convention: `wse_<metric>_<unit>`

use lazy_static::lazy_static;
use prometheus::{Counter, CounterVec, Encoder, Gauge, Opts, Registry, TextEncoder};

use crate::TelemetryError;

lazy_static! {
    /// Registry gathered by `encode_metrics`
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // SUBSCRIPTIONS
    // =========================================================================

    /// Subscriptions currently registered at the event source
    pub static ref SUBSCRIPTIONS_ACTIVE: Gauge = Gauge::new(
        "wse_subscriptions_active",
        "Number of subscriptions currently registered"
    ).expect("metric creation failed");

    /// Subscriptions ever accepted
    pub static ref SUBSCRIPTIONS_TOTAL: Counter = Counter::new(
        "wse_subscriptions_total",
        "Total number of accepted subscriptions"
    ).expect("metric creation failed");

    // =========================================================================
    // DELIVERY
    // =========================================================================

    /// Notifications accepted into a subscription queue
    pub static ref NOTIFICATIONS_OFFERED: Counter = Counter::new(
        "wse_notifications_offered_total",
        "Notifications enqueued for delivery"
    ).expect("metric creation failed");

    /// Notifications pushed successfully
    pub static ref NOTIFICATIONS_DELIVERED: Counter = Counter::new(
        "wse_notifications_delivered_total",
        "Notifications delivered to a sink"
    ).expect("metric creation failed");

    /// Push failures that terminated a subscription
    pub static ref DELIVERY_FAILURES: Counter = Counter::new(
        "wse_delivery_failures_total",
        "Delivery failures that terminated a subscription"
    ).expect("metric creation failed");

    /// Subscriptions shed because their queue was full
    pub static ref QUEUE_OVERFLOWS: Counter = Counter::new(
        "wse_queue_overflows_total",
        "Subscriptions terminated by queue overflow"
    ).expect("metric creation failed");

    // =========================================================================
    // PROTOCOL
    // =========================================================================

    /// Faults returned to peers
    pub static ref FAULTS: CounterVec = CounterVec::new(
        Opts::new("wse_faults_total", "Protocol faults returned to peers"),
        &["subcode"]
    ).expect("metric creation failed");
}

/// Register all metrics with `REGISTRY`. Already-registered metrics are skipped,
/// so repeated calls succeed.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(SUBSCRIPTIONS_ACTIVE.clone()),
        Box::new(SUBSCRIPTIONS_TOTAL.clone()),
        Box::new(NOTIFICATIONS_OFFERED.clone()),
        Box::new(NOTIFICATIONS_DELIVERED.clone()),
        Box::new(DELIVERY_FAILURES.clone()),
        Box::new(QUEUE_OVERFLOWS.clone()),
        Box::new(FAULTS.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }
    Ok(())
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
