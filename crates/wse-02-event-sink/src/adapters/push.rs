//! # Push Endpoints
//!
//! The two contexts a sink registers per subscription: NotifyTo receives
//! notifications and EndTo receives SubscriptionEnd.
//!
//! Each endpoint holds an async mutex across the callback, so the transport
//! only completes a push after the application has handled it and pushes to
//! one endpoint are handled one at a time.

use crate::ports::NotificationCallback;
use crate::service::EventSink;
use async_trait::async_trait;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info};
use wse_transport::MessageHandler;
use wse_types::{Body, Envelope, EventingFault};

/// Subscription id shared by a subscription's two push endpoints.
///
/// Endpoints are registered before the Subscribe response names the id, so
/// an early push waits (bounded) for [`PushBinding::bind`].
#[derive(Debug)]
pub struct PushBinding {
    id: watch::Sender<Option<String>>,
    wait: Duration,
}

impl PushBinding {
    pub fn new(wait: Duration) -> Self {
        let (id, _) = watch::channel(None);
        Self { id, wait }
    }

    pub fn bind(&self, subscription_id: &str) {
        self.id.send_replace(Some(subscription_id.to_string()));
    }

    async fn subscription_id(&self) -> Result<String, EventingFault> {
        let mut bound = self.id.subscribe();
        let id = match tokio::time::timeout(self.wait, bound.wait_for(Option::is_some)).await {
            Ok(Ok(id)) => id.clone(),
            _ => None,
        };
        id.ok_or_else(|| {
            EventingFault::InvalidMessage("push endpoint is not bound to a subscription".to_string())
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushKind {
    Notify,
    End,
}

/// One push context of one subscription.
pub struct PushEndpoint {
    kind: PushKind,
    binding: Arc<PushBinding>,
    callback: Arc<dyn NotificationCallback>,
    sink: Weak<EventSink>,
    serial: Mutex<()>,
}

impl PushEndpoint {
    pub fn new(
        kind: PushKind,
        binding: Arc<PushBinding>,
        callback: Arc<dyn NotificationCallback>,
        sink: Weak<EventSink>,
    ) -> Self {
        Self {
            kind,
            binding,
            callback,
            sink,
            serial: Mutex::new(()),
        }
    }
}

#[async_trait]
impl MessageHandler for PushEndpoint {
    async fn handle(&self, message: Envelope) -> Result<Option<Envelope>, EventingFault> {
        let _serial = self.serial.lock().await;
        let subscription_id = self.binding.subscription_id().await?;
        let action = message.header.action;

        match (self.kind, message.body) {
            (PushKind::Notify, Body::Notification(payload)) => {
                debug!(%subscription_id, %action, "Notification received");
                self.callback
                    .on_notification(&subscription_id, &action, payload)
                    .await;
            }
            (PushKind::End, Body::SubscriptionEnd(end)) => {
                info!(%subscription_id, status = %end.status, "Subscription ended by source");
                if let Some(sink) = self.sink.upgrade() {
                    sink.release(&subscription_id);
                }
                self.callback
                    .on_subscription_end(&subscription_id, &end.status, end.reason.as_deref())
                    .await;
            }
            (kind, body) => {
                return Err(EventingFault::InvalidMessage(format!(
                    "{} body not accepted at {kind:?} endpoint",
                    body.name()
                )));
            }
        }
        Ok(None)
    }
}
