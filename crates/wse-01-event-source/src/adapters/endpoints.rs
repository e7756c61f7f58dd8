//! # Transport Endpoints
//!
//! `MessageHandler` implementations binding the event source to its
//! transport contexts. Handlers hold a weak reference so the transport's
//! context table does not keep a dropped source alive.

use crate::service::EventSource;
use async_trait::async_trait;
use std::sync::{Arc, Weak};
use tracing::debug;
use wse_telemetry::{metric_inc, FAULTS};
use wse_transport::MessageHandler;
use wse_types::constants::ACTION_SUBSCRIBE;
use wse_types::{Envelope, EventingFault};

fn upgrade(source: &Weak<EventSource>) -> Result<Arc<EventSource>, EventingFault> {
    source.upgrade().ok_or_else(|| {
        EventingFault::EventSourceUnableToProcess("event source has been dropped".to_string())
    })
}

fn record(result: Result<Envelope, EventingFault>) -> Result<Option<Envelope>, EventingFault> {
    match result {
        Ok(response) => Ok(Some(response)),
        Err(fault) => {
            metric_inc!(FAULTS, &[fault.subcode()]);
            debug!(subcode = fault.subcode(), reason = fault.reason(), "Request faulted");
            Err(fault)
        }
    }
}

/// Accepts Subscribe requests.
pub struct SourceEndpoint {
    source: Weak<EventSource>,
}

impl SourceEndpoint {
    pub fn new(source: Weak<EventSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl MessageHandler for SourceEndpoint {
    async fn handle(&self, message: Envelope) -> Result<Option<Envelope>, EventingFault> {
        let source = upgrade(&self.source)?;
        if message.action() != ACTION_SUBSCRIBE {
            return record(Err(EventingFault::InvalidMessage(format!(
                "action {} not served at the event source endpoint",
                message.action()
            ))));
        }
        record(source.subscribe(&message))
    }
}

/// Serves Renew, GetStatus and Unsubscribe at one subscription's manager address.
pub struct ManagerEndpoint {
    source: Weak<EventSource>,
}

impl ManagerEndpoint {
    pub fn new(source: Weak<EventSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl MessageHandler for ManagerEndpoint {
    async fn handle(&self, message: Envelope) -> Result<Option<Envelope>, EventingFault> {
        let source = upgrade(&self.source)?;
        record(source.handle_manager_request(&message).await)
    }
}
