//! # Transport Ports
//!
//! Traits the engine requires from its host.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use wse_types::{Envelope, EventingFault};

/// Errors from moving a message between endpoints.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Nothing is listening at the destination.
    #[error("Endpoint unreachable: {0}")]
    Unreachable(String),

    /// A context is already registered at this address.
    #[error("Context already registered: {0}")]
    ContextInUse(String),

    /// A request/response exchange produced no response.
    #[error("No response from {0}")]
    NoResponse(String),

    /// The receiver answered a one-way message with a fault.
    #[error("Message rejected by {address}: {subcode}")]
    Rejected { address: String, subcode: String },

    /// Any other I/O failure.
    #[error("Send failed: {0}")]
    Failed(String),
}

/// Serves the messages arriving at one registered context.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// Handle one inbound message.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(response))` - request/response exchange
    /// - `Ok(None)` - one-way message accepted
    /// - `Err(fault)` - the transport answers with the fault envelope
    async fn handle(&self, message: Envelope) -> Result<Option<Envelope>, EventingFault>;
}

/// Outbound messaging and the local context table.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; every subscription's delivery task
/// shares the same transport.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `request` to `request.header.to` and wait for the response.
    ///
    /// Faults raised by the remote handler come back as fault envelopes, not errors.
    async fn send_request_response(&self, request: Envelope) -> Result<Envelope, TransportError>;

    /// Send `message` to `message.header.to` without expecting a response body.
    ///
    /// Completes once the receiver has finished handling the message.
    async fn send_one_way(&self, message: Envelope) -> Result<(), TransportError>;

    /// Serve `handler` at `base + path`; returns the full address.
    fn register_context(
        &self,
        base: &str,
        path: &str,
        handler: Arc<dyn MessageHandler>,
    ) -> Result<String, TransportError>;

    /// Stop serving `base + path`. Returns whether a context was removed.
    fn unregister_context(&self, base: &str, path: &str) -> bool;
}

/// Join a base address and a context path.
#[must_use]
pub fn context_address(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}
