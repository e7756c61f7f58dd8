//! Background lease renewal.

use super::EventSink;
use std::sync::Weak;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Renew subscription `id` `lead` before each expiry, asking for the lease
/// originally requested. Exits on the first failed renew or once the sink or
/// the subscription is gone.
pub(crate) fn spawn(sink: Weak<EventSink>, id: String, lead: chrono::Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let wait = {
                let Some(proxy) = sink.upgrade().and_then(|sink| sink.subscription(&id)) else {
                    return;
                };
                let remaining = proxy.subscription().remaining_time();
                // Leases shorter than twice the lead renew at half-life instead.
                let wait = match lead.checked_mul(2) {
                    Some(twice) if remaining > twice => remaining - lead,
                    _ => remaining / 2,
                };
                wait.to_std().unwrap_or_default()
            };
            tokio::time::sleep(wait).await;

            let Some(sink) = sink.upgrade() else {
                return;
            };
            let Some(requested) = sink.subscription(&id).map(|p| p.requested().copied()) else {
                return;
            };
            match sink.renew(&id, requested).await {
                Ok(granted) => debug!(subscription_id = %id, expires = %granted, "Auto-renewed"),
                Err(e) => {
                    warn!(subscription_id = %id, error = %e, "Auto-renew failed, giving up");
                    return;
                }
            }
        }
    })
}
