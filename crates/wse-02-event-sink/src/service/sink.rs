//! # Event Sink Client
//!
//! Subscribes to remote event sources and manages the resulting
//! subscriptions through their subscription-manager endpoints.

use crate::adapters::{PushBinding, PushEndpoint, PushKind};
use crate::config::{ConfigError, EventSinkConfig};
use crate::domain::{ProxyStore, SinkError, SubscriptionProxy};
use crate::ports::NotificationCallback;
use chrono::Utc;
use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;
use wse_transport::Transport;
use wse_types::constants::{
    ACTION_GET_STATUS, ACTION_GET_STATUS_RESPONSE, ACTION_RENEW, ACTION_RENEW_RESPONSE,
    ACTION_SUBSCRIBE, ACTION_SUBSCRIBE_RESPONSE, ACTION_UNSUBSCRIBE, ACTION_UNSUBSCRIBE_RESPONSE,
    DELIVERY_MODE_PUSH,
};
use wse_types::{
    addressing, Body, EndpointReference, Envelope, EventingFault, Expires, Filter,
    SubscribeRequest, Subscription,
};

/// A WS-Eventing event sink.
pub struct EventSink {
    config: EventSinkConfig,
    transport: Arc<dyn Transport>,
    proxies: ProxyStore,
}

impl std::fmt::Debug for EventSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSink")
            .field("local_base", &self.config.local_base)
            .field("subscriptions", &self.proxies.len())
            .finish()
    }
}

impl EventSink {
    pub fn new(transport: Arc<dyn Transport>, config: EventSinkConfig) -> Result<Arc<Self>, ConfigError> {
        config.validate()?;
        Ok(Arc::new(Self {
            config,
            transport,
            proxies: ProxyStore::new(),
        }))
    }

    #[must_use]
    pub fn config(&self) -> &EventSinkConfig {
        &self.config
    }

    #[must_use]
    pub fn subscription(&self, id: &str) -> Option<Arc<SubscriptionProxy>> {
        self.proxies.get(id)
    }

    #[must_use]
    pub fn subscription_ids(&self) -> Vec<String> {
        self.proxies.ids()
    }

    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.proxies.len()
    }

    /// Subscribe to `actions` at the source endpoint `source`.
    pub async fn subscribe_actions<I, S>(
        self: &Arc<Self>,
        source: &str,
        actions: I,
        expires: Option<Expires>,
        callback: Arc<dyn NotificationCallback>,
    ) -> Result<(String, Expires), SinkError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.subscribe(source, Filter::actions(actions), expires, callback)
            .await
    }

    /// Subscribe at the source endpoint `source`.
    ///
    /// Registers this subscription's two push endpoints, sends Subscribe and
    /// stores a local proxy. Returns the subscription id and the granted lease.
    pub async fn subscribe(
        self: &Arc<Self>,
        source: &str,
        filter: Filter,
        expires: Option<Expires>,
        callback: Arc<dyn NotificationCallback>,
    ) -> Result<(String, Expires), SinkError> {
        let token = Uuid::new_v4();
        let notify_path = format!("{}/{}/notify", self.config.push_path_prefix, token);
        let end_path = format!("{}/{}/end", self.config.push_path_prefix, token);
        let binding = Arc::new(PushBinding::new(self.config.request_timeout()));

        let notify_address = self.register_push(&notify_path, PushKind::Notify, &binding, &callback)?;
        let end_address = match self.register_push(&end_path, PushKind::End, &binding, &callback) {
            Ok(address) => address,
            Err(e) => {
                self.transport
                    .unregister_context(&self.config.local_base, &notify_path);
                return Err(e);
            }
        };

        let actions: BTreeSet<String> = filter
            .content
            .split_whitespace()
            .map(str::to_string)
            .collect();
        let notify_to = EndpointReference::new(notify_address);
        let end_to = EndpointReference::new(end_address);
        let request = Envelope::new(
            addressing::request(ACTION_SUBSCRIBE, source),
            Body::Subscribe(SubscribeRequest {
                end_to: Some(end_to.clone()),
                delivery_mode: Some(DELIVERY_MODE_PUSH.to_string()),
                notify_to: vec![notify_to.clone()],
                expires,
                filter: Some(filter),
            }),
        );

        let accepted = self
            .call(request, ACTION_SUBSCRIBE_RESPONSE)
            .await
            .and_then(|response| match response.body {
                Body::SubscribeResponse {
                    subscription_manager,
                    expires,
                } => Ok((subscription_manager, expires)),
                other => Err(SinkError::UnexpectedResponse {
                    expected: "SubscribeResponse",
                    actual: other.name().to_string(),
                }),
            })
            .and_then(|(manager, granted)| {
                let id = subscription_id_of(&manager).ok_or_else(|| {
                    SinkError::Fault(EventingFault::InvalidMessage(format!(
                        "subscription manager {} carries no identifier",
                        manager.address
                    )))
                })?;
                Ok((id, manager, granted))
            });

        let (id, manager, granted) = match accepted {
            Ok(accepted) => accepted,
            Err(e) => {
                for path in [&notify_path, &end_path] {
                    self.transport.unregister_context(&self.config.local_base, path);
                }
                warn!(%source, error = %e, "Subscribe failed");
                return Err(e);
            }
        };

        let subscription = Subscription::new(
            id.clone(),
            notify_to,
            Some(end_to),
            manager,
            actions,
            granted.relative_to(Utc::now()),
        );
        let proxy = Arc::new(SubscriptionProxy::new(subscription, expires, notify_path, end_path));
        self.proxies.insert(Arc::clone(&proxy));
        binding.bind(&id);

        if let Some(lead) = self.config.auto_renew_lead() {
            proxy.set_renewer(super::renewal::spawn(Arc::downgrade(self), id.clone(), lead));
        }

        info!(subscription_id = %id, %source, expires = %granted, "Subscribed");
        Ok((id, granted))
    }

    /// Renew a subscription; returns the newly granted lease.
    pub async fn renew(&self, id: &str, expires: Option<Expires>) -> Result<Expires, SinkError> {
        let proxy = self.proxy(id)?;
        let request = Envelope::new(
            addressing::to_epr(proxy.subscription().manager(), ACTION_RENEW),
            Body::Renew { expires },
        );

        let response = self.call(request, ACTION_RENEW_RESPONSE).await?;
        let Body::RenewResponse { expires: granted } = response.body else {
            return Err(unexpected("RenewResponse", &response.body));
        };

        proxy.subscription().renew(granted.relative_to(Utc::now()));
        debug!(subscription_id = %id, expires = %granted, "Renewed");
        Ok(granted)
    }

    /// Remaining lease as reported by the source.
    pub async fn get_status(&self, id: &str) -> Result<Expires, SinkError> {
        let proxy = self.proxy(id)?;
        let request = Envelope::new(
            addressing::to_epr(proxy.subscription().manager(), ACTION_GET_STATUS),
            Body::GetStatus,
        );

        let response = self.call(request, ACTION_GET_STATUS_RESPONSE).await?;
        match response.body {
            Body::GetStatusResponse { expires } => Ok(expires),
            other => Err(unexpected("GetStatusResponse", &other)),
        }
    }

    /// Cancel a subscription at its source.
    ///
    /// Local state is released whether or not the source acknowledges.
    pub async fn unsubscribe(&self, id: &str) -> Result<(), SinkError> {
        let proxy = self.proxy(id)?;
        proxy.cancel_renewer();
        let request = Envelope::new(
            addressing::to_epr(proxy.subscription().manager(), ACTION_UNSUBSCRIBE),
            Body::Unsubscribe,
        );

        let result = self.call(request, ACTION_UNSUBSCRIBE_RESPONSE).await.map(|_| ());
        self.release(id);
        match &result {
            Ok(()) => info!(subscription_id = %id, "Unsubscribed"),
            Err(e) => warn!(subscription_id = %id, error = %e, "Unsubscribe not acknowledged"),
        }
        result
    }

    /// Unsubscribe everything, concurrently and within `shutdown_timeout`.
    ///
    /// Never fails: errors are logged and local state is cleared regardless.
    /// Returns how many unsubscribes the sources acknowledged.
    pub async fn unsubscribe_all(&self) -> usize {
        let ids = self.proxies.ids();
        if ids.is_empty() {
            return 0;
        }

        let mut attempts: FuturesUnordered<_> = ids.iter().map(|id| self.unsubscribe(id)).collect();
        let deadline = tokio::time::sleep(self.config.shutdown_timeout());
        tokio::pin!(deadline);
        let mut acknowledged = 0;
        loop {
            tokio::select! {
                next = attempts.next() => match next {
                    Some(Ok(())) => acknowledged += 1,
                    Some(Err(_)) => {}
                    None => break,
                },
                () = &mut deadline => {
                    warn!(
                        pending = attempts.len(),
                        acknowledged,
                        timeout_ms = self.config.shutdown_timeout_ms,
                        "unsubscribe_all timed out"
                    );
                    break;
                }
            }
        }
        drop(attempts);

        for id in self.proxies.ids() {
            self.release(&id);
        }
        info!(total = ids.len(), acknowledged, "Unsubscribed all");
        acknowledged
    }

    /// Drop local state for `id`: the proxy, its renewer and its push contexts.
    pub(crate) fn release(&self, id: &str) -> bool {
        let Some(proxy) = self.proxies.remove(id) else {
            return false;
        };
        proxy.cancel_renewer();
        for path in proxy.push_paths() {
            self.transport.unregister_context(&self.config.local_base, path);
        }
        debug!(subscription_id = %id, "Local subscription state released");
        true
    }

    fn proxy(&self, id: &str) -> Result<Arc<SubscriptionProxy>, SinkError> {
        self.proxies
            .get(id)
            .ok_or_else(|| SinkError::SubscriptionNotFound(id.to_string()))
    }

    fn register_push(
        self: &Arc<Self>,
        path: &str,
        kind: PushKind,
        binding: &Arc<PushBinding>,
        callback: &Arc<dyn NotificationCallback>,
    ) -> Result<String, SinkError> {
        let endpoint = PushEndpoint::new(
            kind,
            Arc::clone(binding),
            Arc::clone(callback),
            Arc::downgrade(self),
        );
        let address = self
            .transport
            .register_context(&self.config.local_base, path, Arc::new(endpoint))?;
        debug!(%address, ?kind, "Push endpoint registered");
        Ok(address)
    }

    /// One bounded request/response exchange. Fault envelopes become
    /// [`SinkError::Fault`]; any other action than `expected` is unexpected.
    async fn call(&self, request: Envelope, expected: &'static str) -> Result<Envelope, SinkError> {
        let timeout = self.config.request_timeout();
        let response = tokio::time::timeout(timeout, self.transport.send_request_response(request))
            .await
            .map_err(|_| SinkError::Timeout(timeout))??;

        if let Body::Fault(detail) = &response.body {
            return Err(SinkError::Fault(EventingFault::from_detail(detail)));
        }
        if response.action() != expected {
            return Err(SinkError::UnexpectedResponse {
                expected,
                actual: response.action().to_string(),
            });
        }
        Ok(response)
    }
}

/// Subscription id named by a manager EPR: its Identifier parameter, or the
/// last path segment of its address.
fn subscription_id_of(manager: &EndpointReference) -> Option<String> {
    manager
        .identifier()
        .or_else(|| {
            manager
                .address
                .rsplit_once('/')
                .map(|(_, id)| id)
                .filter(|id| !id.is_empty())
        })
        .map(str::to_string)
}

fn unexpected(expected: &'static str, body: &Body) -> SinkError {
    SinkError::UnexpectedResponse {
        expected,
        actual: body.name().to_string(),
    }
}
