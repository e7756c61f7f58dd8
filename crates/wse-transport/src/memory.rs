//! # In-Memory Transport
//!
//! Routes envelopes straight to the handler registered at `header.to`.
//! Suitable for single-process deployments and tests; a network deployment
//! would put an HTTP/SOAP binding behind the same `Transport` trait.

use crate::ports::{context_address, MessageHandler, Transport, TransportError};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};
use wse_types::Envelope;

/// Address → handler table shared by every endpoint in the process.
#[derive(Default)]
pub struct InMemoryTransport {
    /// Registered contexts by full address.
    contexts: RwLock<HashMap<String, Arc<dyn MessageHandler>>>,

    /// Total messages handed to a handler.
    messages_sent: AtomicU64,
}

impl InMemoryTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered contexts.
    #[must_use]
    pub fn context_count(&self) -> usize {
        self.contexts.read().len()
    }

    #[must_use]
    pub fn is_registered(&self, address: &str) -> bool {
        self.contexts.read().contains_key(address)
    }

    /// Total messages delivered to a handler.
    #[must_use]
    pub fn messages_sent(&self) -> u64 {
        self.messages_sent.load(Ordering::Relaxed)
    }

    fn route(&self, address: &str) -> Result<Arc<dyn MessageHandler>, TransportError> {
        // Clone the handler out so the table lock is not held across the call.
        self.contexts
            .read()
            .get(address)
            .cloned()
            .ok_or_else(|| TransportError::Unreachable(address.to_string()))
    }
}

#[async_trait]
impl Transport for InMemoryTransport {
    async fn send_request_response(&self, request: Envelope) -> Result<Envelope, TransportError> {
        let address = request.header.to.clone();
        let handler = self.route(&address)?;
        let header = request.header.clone();
        self.messages_sent.fetch_add(1, Ordering::Relaxed);

        match handler.handle(request).await {
            Ok(Some(response)) => Ok(response),
            Ok(None) => Err(TransportError::NoResponse(address)),
            Err(fault) => {
                debug!(address = %address, subcode = fault.subcode(), "Handler raised fault");
                Ok(fault.to_envelope(&header))
            }
        }
    }

    async fn send_one_way(&self, message: Envelope) -> Result<(), TransportError> {
        let address = message.header.to.clone();
        let handler = self.route(&address)?;
        self.messages_sent.fetch_add(1, Ordering::Relaxed);

        match handler.handle(message).await {
            Ok(_) => Ok(()),
            Err(fault) => {
                warn!(address = %address, subcode = fault.subcode(), "One-way message rejected");
                Err(TransportError::Rejected {
                    address,
                    subcode: fault.subcode().to_string(),
                })
            }
        }
    }

    fn register_context(
        &self,
        base: &str,
        path: &str,
        handler: Arc<dyn MessageHandler>,
    ) -> Result<String, TransportError> {
        let address = context_address(base, path);
        let mut contexts = self.contexts.write();
        if contexts.contains_key(&address) {
            return Err(TransportError::ContextInUse(address));
        }
        contexts.insert(address.clone(), handler);
        debug!(address = %address, "Context registered");
        Ok(address)
    }

    fn unregister_context(&self, base: &str, path: &str) -> bool {
        let address = context_address(base, path);
        let removed = self.contexts.write().remove(&address).is_some();
        if removed {
            debug!(address = %address, "Context unregistered");
        }
        removed
    }
}
