//! # Event Source Service
//!
//! Serves Subscribe at the source endpoint and Renew / GetStatus /
//! Unsubscribe at each subscription's manager endpoint, and fans published
//! notifications out to the matching subscriptions.

use super::{messages, validation};
use crate::adapters::{ContextReleaser, ManagerEndpoint, SourceEndpoint};
use crate::config::{ConfigError, EventSourceConfig};
use crate::domain::{SourceSubscriptionManager, SubscriptionRegistry, TerminationCause};
use crate::ports::EventSourceApi;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use wse_telemetry::{metric_inc, SUBSCRIPTIONS_TOTAL};
use wse_transport::ports::context_address;
use wse_transport::{Transport, TransportError};
use wse_types::constants::{
    ACTION_GET_STATUS_RESPONSE, ACTION_RENEW_RESPONSE, ACTION_SUBSCRIBE_RESPONSE,
    ACTION_UNSUBSCRIBE_RESPONSE, STATUS_DELIVERY_FAILURE, STATUS_SOURCE_CANCELING,
    STATUS_SOURCE_SHUTTING_DOWN,
};
use wse_types::{
    addressing, Body, EndpointReference, Envelope, EventingFault, Expires, Header,
    ReferenceParameter, Subscription,
};

/// A WS-Eventing event source.
pub struct EventSource {
    config: EventSourceConfig,
    offered: BTreeSet<String>,
    transport: Arc<dyn Transport>,
    registry: SubscriptionRegistry,
    closed: AtomicBool,
    shutdown_signal: watch::Sender<bool>,
}

impl std::fmt::Debug for EventSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSource")
            .field("address", &self.address())
            .field("subscriptions", &self.registry.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl EventSource {
    /// Create a source serving under `config.base_address`.
    pub fn new(config: EventSourceConfig, transport: Arc<dyn Transport>) -> Result<Arc<Self>, ConfigError> {
        config.validate()?;

        let registry = SubscriptionRegistry::new();
        registry.add_observer(Arc::new(ContextReleaser::new(
            Arc::clone(&transport),
            config.clone(),
        )));
        let (shutdown_signal, _) = watch::channel(false);

        Ok(Arc::new(Self {
            offered: config.offered_actions.iter().cloned().collect(),
            config,
            transport,
            registry,
            closed: AtomicBool::new(false),
            shutdown_signal,
        }))
    }

    /// Start accepting Subscribe requests at [`Self::address`].
    pub fn bind(self: &Arc<Self>) -> Result<String, TransportError> {
        let address = self.transport.register_context(
            &self.config.base_address,
            &self.config.source_path,
            Arc::new(SourceEndpoint::new(Arc::downgrade(self))),
        )?;
        info!(%address, offered = self.offered.len(), "Event source listening");
        Ok(address)
    }

    /// Address of the Subscribe endpoint.
    #[must_use]
    pub fn address(&self) -> String {
        context_address(&self.config.base_address, &self.config.source_path)
    }

    #[must_use]
    pub fn config(&self) -> &EventSourceConfig {
        &self.config
    }

    #[must_use]
    pub fn registry(&self) -> &SubscriptionRegistry {
        &self.registry
    }

    #[must_use]
    pub fn subscription(&self, id: &str) -> Option<Arc<SourceSubscriptionManager>> {
        self.registry.get(id)
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Handle a Subscribe request.
    ///
    /// Checks run in order: delivery mode, NotifyTo, EndTo, Expires, Filter.
    /// The first failure is returned as the fault.
    pub fn subscribe(self: &Arc<Self>, request: &Envelope) -> Result<Envelope, EventingFault> {
        let Body::Subscribe(subscribe) = &request.body else {
            return Err(unexpected_body(request));
        };
        if self.is_closed() {
            return Err(EventingFault::EventSourceUnableToProcess(
                "event source is shutting down".to_string(),
            ));
        }

        validation::validate_delivery_mode(subscribe.delivery_mode.as_deref())?;
        let notify_to = validation::validate_notify_to(&subscribe.notify_to)?;
        validation::validate_end_to(subscribe.end_to.as_ref())?;
        let granted = validation::grant_expires(
            subscribe.expires.as_ref(),
            self.config.max_expires(),
            Utc::now(),
        )?;
        let actions = validation::parse_action_filter(subscribe.filter.as_ref(), &self.offered)?;

        let id = Subscription::generate_id();
        let path = self.config.manager_path(&id);
        let address = self
            .transport
            .register_context(
                &self.config.base_address,
                &path,
                Arc::new(ManagerEndpoint::new(Arc::downgrade(self))),
            )
            .map_err(|e| EventingFault::EventSourceUnableToProcess(e.to_string()))?;
        let manager_epr =
            EndpointReference::new(address).with_parameter(ReferenceParameter::identifier(&id));

        let subscription = Subscription::new(
            id.clone(),
            notify_to,
            subscribe.end_to.clone(),
            manager_epr.clone(),
            actions,
            granted,
        );
        let manager = Arc::new(SourceSubscriptionManager::new(
            subscription,
            Arc::clone(&self.transport),
            self.config.queue_capacity,
        ));
        manager.start();

        if let Err(e) = self.registry.add(Arc::clone(&manager)) {
            manager.shutdown(TerminationCause::SourceShutdown);
            self.transport.unregister_context(&self.config.base_address, &path);
            return Err(EventingFault::EventSourceUnableToProcess(e.to_string()));
        }
        if self.is_closed() {
            // Lost a race with shutdown.
            self.registry.remove(&id, TerminationCause::SourceShutdown);
            manager.abort(TerminationCause::SourceShutdown);
            return Err(EventingFault::EventSourceUnableToProcess(
                "event source is shutting down".to_string(),
            ));
        }

        metric_inc!(SUBSCRIPTIONS_TOTAL);
        info!(
            subscription_id = %id,
            notify_to = %manager.subscription().notify_to().address,
            actions = ?manager.subscription().filter(),
            granted_secs = granted.num_seconds(),
            "Subscription created"
        );

        Ok(Envelope::new(
            addressing::reply(&request.header, ACTION_SUBSCRIBE_RESPONSE),
            Body::SubscribeResponse {
                subscription_manager: manager_epr,
                expires: Expires::Duration(granted),
            },
        ))
    }

    /// Handle a request arriving at a manager endpoint.
    pub async fn handle_manager_request(&self, request: &Envelope) -> Result<Envelope, EventingFault> {
        match &request.body {
            Body::Renew { .. } => self.renew(request),
            Body::GetStatus => self.get_status(request),
            Body::Unsubscribe => self.unsubscribe(request).await,
            _ => Err(unexpected_body(request)),
        }
    }

    /// Extend a running subscription's lease.
    pub fn renew(&self, request: &Envelope) -> Result<Envelope, EventingFault> {
        let Body::Renew { expires } = &request.body else {
            return Err(unexpected_body(request));
        };
        let manager = self.resolve(&request.header)?;
        let granted =
            validation::grant_expires(expires.as_ref(), self.config.max_expires(), Utc::now())?;

        if !manager.is_running() || manager.subscription().is_expired() {
            return Err(EventingFault::UnableToRenew(format!(
                "subscription {} is no longer active",
                manager.id()
            )));
        }

        manager.subscription().renew(granted);
        debug!(subscription_id = %manager.id(), granted_secs = granted.num_seconds(), "Subscription renewed");

        Ok(Envelope::new(
            addressing::reply(&request.header, ACTION_RENEW_RESPONSE),
            Body::RenewResponse {
                expires: Expires::Duration(granted),
            },
        ))
    }

    /// Report the remaining lease.
    pub fn get_status(&self, request: &Envelope) -> Result<Envelope, EventingFault> {
        let manager = self.resolve(&request.header)?;
        let remaining = manager.subscription().remaining_time();
        if remaining <= chrono::Duration::zero() {
            return Err(EventingFault::InvalidMessage(format!(
                "subscription {} has expired",
                manager.id()
            )));
        }

        Ok(Envelope::new(
            addressing::reply(&request.header, ACTION_GET_STATUS_RESPONSE),
            Body::GetStatusResponse {
                expires: Expires::Duration(remaining),
            },
        ))
    }

    /// Remove the subscription and wait for its worker to finish.
    pub async fn unsubscribe(&self, request: &Envelope) -> Result<Envelope, EventingFault> {
        let manager = self.resolve(&request.header)?;
        self.registry.remove(manager.id(), TerminationCause::Unsubscribed);
        manager.stop(TerminationCause::Unsubscribed).await;
        info!(subscription_id = %manager.id(), "Subscription cancelled by sink");

        Ok(Envelope::new(
            addressing::reply(&request.header, ACTION_UNSUBSCRIBE_RESPONSE),
            Body::UnsubscribeResponse,
        ))
    }

    /// Cancel every subscription, telling sinks with an EndTo address.
    /// Returns the number cancelled.
    pub fn cancel_all(&self, reason: Option<&str>) -> usize {
        let notified = self.broadcast_end(STATUS_SOURCE_CANCELING, reason).len();
        let removed = self.registry.remove_all(TerminationCause::SourceShutdown);
        info!(cancelled = removed.len(), notified, "Cancelled all subscriptions");
        removed.len()
    }

    /// Run [`EventSourceApi::sweep`] every `sweep_interval_ms` until shutdown.
    pub fn spawn_sweeper(self: &Arc<Self>) -> JoinHandle<()> {
        let source = Arc::downgrade(self);
        let mut shutdown = self.shutdown_signal.subscribe();
        let period = self.config.sweep_interval();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let Some(source) = source.upgrade() else { break };
                        if source.is_closed() {
                            break;
                        }
                        source.sweep();
                    }
                    _ = shutdown.changed() => break,
                }
            }
            debug!("Subscription sweeper stopped");
        })
    }

    /// The manager addressed by a request: the Identifier reference
    /// parameter when present, otherwise the last path segment of `To`.
    fn resolve(&self, header: &Header) -> Result<Arc<SourceSubscriptionManager>, EventingFault> {
        let id = addressing::identifier(header).or_else(|| {
            header
                .to
                .rsplit_once('/')
                .map(|(_, id)| id)
                .filter(|id| !id.is_empty())
        });
        id.and_then(|id| self.registry.get(id)).ok_or_else(|| {
            EventingFault::InvalidMessage(format!("no subscription at {}", header.to))
        })
    }

    fn broadcast_end(&self, status: &str, reason: Option<&str>) -> Vec<JoinHandle<()>> {
        self.registry
            .all()
            .into_iter()
            .filter_map(|manager| {
                messages::subscription_end(manager.subscription(), status, reason)
                    .map(|message| manager.send_end_to(message))
            })
            .collect()
    }
}

#[async_trait]
impl EventSourceApi for EventSource {
    fn send_notification(&self, action: &str, payload: serde_json::Value) -> usize {
        if self.is_closed() {
            return 0;
        }
        self.sweep();

        let subscribers = self.registry.subscribers_of(action);
        let accepted = subscribers
            .iter()
            .filter(|manager| {
                manager.offer_notification(messages::notification(
                    manager.subscription(),
                    action,
                    &payload,
                ))
            })
            .count();

        debug!(action, subscribers = subscribers.len(), accepted, "Notification dispatched");
        accepted
    }

    fn subscription_end_to_all(&self, status: &str, reason: Option<&str>) -> usize {
        self.broadcast_end(status, reason).len()
    }

    fn sweep(&self) -> usize {
        let evicted = self.registry.sweep();
        for manager in &evicted {
            let reason = match manager.termination_cause() {
                Some(TerminationCause::DeliveryFailure) => "notification delivery failed",
                Some(TerminationCause::QueueOverflow) => "delivery queue overflowed",
                _ => continue,
            };
            let end = messages::subscription_end(
                manager.subscription(),
                STATUS_DELIVERY_FAILURE,
                Some(reason),
            );
            if let Some(message) = end {
                manager.send_end_to(message);
            }
        }
        evicted.len()
    }

    fn subscription_count(&self) -> usize {
        self.registry.len()
    }

    async fn shutdown(&self, grace: Duration) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        info!(subscriptions = self.registry.len(), "Event source shutting down");

        self.shutdown_signal.send_replace(true);
        self.transport
            .unregister_context(&self.config.base_address, &self.config.source_path);

        let pending =
            self.broadcast_end(STATUS_SOURCE_SHUTTING_DOWN, Some("event source shutting down"));
        let notified = pending.len();
        if tokio::time::timeout(grace, futures::future::join_all(pending))
            .await
            .is_err()
        {
            warn!(grace_ms = grace.as_millis() as u64, "SubscriptionEnd broadcast exceeded grace period");
        }

        let removed = self.registry.remove_all(TerminationCause::SourceShutdown);
        for manager in &removed {
            manager.abort(TerminationCause::SourceShutdown);
        }
        info!(notified, removed = removed.len(), "Event source stopped");
    }
}

fn unexpected_body(request: &Envelope) -> EventingFault {
    EventingFault::InvalidMessage(format!(
        "unexpected {} body for action {}",
        request.body.name(),
        request.action()
    ))
}
