//! Sink client errors.

use std::time::Duration;
use thiserror::Error;
use wse_transport::TransportError;
use wse_types::EventingFault;

/// Errors returned by [`crate::EventSink`] operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SinkError {
    /// No local proxy under this id.
    #[error("subscription not found: {0}")]
    SubscriptionNotFound(String),

    /// The event source answered with a fault.
    #[error("event source fault: {0}")]
    Fault(#[from] EventingFault),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("unexpected response: expected {expected}, got {actual}")]
    UnexpectedResponse {
        expected: &'static str,
        actual: String,
    },

    #[error("request timed out after {0:?}")]
    Timeout(Duration),
}
