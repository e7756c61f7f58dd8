//! # Envelope
//!
//! The typed message exchanged between event sources, event sinks and the
//! transport. Wire marshalling is the transport's concern; the engine only
//! ever sees these structures.

use crate::addressing::{EndpointReference, ReferenceParameter};
use crate::expires::Expires;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// WS-Addressing message information headers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// `wsa:Action`
    pub action: String,
    /// `wsa:To`
    pub to: String,
    /// `wsa:MessageID`
    pub message_id: Uuid,
    /// `wsa:RelatesTo`, set on responses and faults.
    pub relates_to: Option<Uuid>,
    /// Reference parameters echoed from the target EPR.
    #[serde(default)]
    pub reference_parameters: Vec<ReferenceParameter>,
}

/// A complete protocol message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub header: Header,
    pub body: Body,
}

impl Envelope {
    pub fn new(header: Header, body: Body) -> Self {
        Self { header, body }
    }

    #[must_use]
    pub fn action(&self) -> &str {
        &self.header.action
    }

    #[must_use]
    pub fn is_fault(&self) -> bool {
        matches!(self.body, Body::Fault(_))
    }
}

/// Filter element of a Subscribe request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    /// Dialect URI; absent means the (unsupported) default XPath dialect.
    pub dialect: Option<String>,
    /// Dialect-specific content.
    pub content: String,
}

impl Filter {
    /// Action-list filter over `actions`.
    pub fn actions<I, S>(actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let content = actions
            .into_iter()
            .map(|a| a.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(" ");
        Self {
            dialect: Some(crate::constants::FILTER_DIALECT_ACTION.to_string()),
            content,
        }
    }
}

/// Body of a Subscribe request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscribeRequest {
    pub end_to: Option<EndpointReference>,
    /// Delivery mode URI; absent means push.
    pub delivery_mode: Option<String>,
    /// Content of the `NotifyTo` element. Exactly one valid EPR is accepted.
    pub notify_to: Vec<EndpointReference>,
    pub expires: Option<Expires>,
    pub filter: Option<Filter>,
}

/// Body of a SubscriptionEnd message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionEnd {
    pub subscription_manager: EndpointReference,
    /// One of the `STATUS_*` URIs.
    pub status: String,
    pub reason: Option<String>,
}

/// SOAP 1.2 fault code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FaultCode {
    Sender,
    Receiver,
}

/// Body of a SOAP fault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaultDetail {
    pub code: FaultCode,
    /// Qualified subcode, e.g. `wse:InvalidExpirationTime`.
    pub subcode: String,
    pub reason: String,
}

/// Message bodies understood by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Body {
    Subscribe(SubscribeRequest),
    SubscribeResponse {
        subscription_manager: EndpointReference,
        expires: Expires,
    },
    Renew {
        expires: Option<Expires>,
    },
    RenewResponse {
        expires: Expires,
    },
    GetStatus,
    GetStatusResponse {
        expires: Expires,
    },
    Unsubscribe,
    UnsubscribeResponse,
    SubscriptionEnd(SubscriptionEnd),
    /// Application payload of a pushed notification.
    Notification(serde_json::Value),
    Fault(FaultDetail),
}

impl Body {
    /// Short name for logs and error messages.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Subscribe(_) => "Subscribe",
            Self::SubscribeResponse { .. } => "SubscribeResponse",
            Self::Renew { .. } => "Renew",
            Self::RenewResponse { .. } => "RenewResponse",
            Self::GetStatus => "GetStatus",
            Self::GetStatusResponse { .. } => "GetStatusResponse",
            Self::Unsubscribe => "Unsubscribe",
            Self::UnsubscribeResponse => "UnsubscribeResponse",
            Self::SubscriptionEnd(_) => "SubscriptionEnd",
            Self::Notification(_) => "Notification",
            Self::Fault(_) => "Fault",
        }
    }
}
