//! # Fault Taxonomy
//!
//! Protocol faults returned to the peer that issued a bad request. They never
//! surface as errors to the application that publishes notifications.

use crate::addressing;
use crate::constants::WSA_FAULT_ACTION;
use crate::envelope::{Body, Envelope, FaultCode, FaultDetail, Header};
use thiserror::Error;

/// A WS-Eventing protocol fault.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EventingFault {
    /// The requested delivery mode is not push.
    #[error("delivery mode requested unavailable: {0}")]
    DeliveryModeRequestedUnavailable(String),

    /// Expires was present but not a positive lease.
    #[error("invalid expiration time: {0}")]
    InvalidExpirationTime(String),

    /// Filter dialect missing or unsupported.
    #[error("filtering requested unavailable: {0}")]
    FilteringRequestedUnavailable(String),

    /// The filter names an action the source does not publish.
    #[error("filter action not supported: {0}")]
    FilterActionNotSupported(String),

    /// The source cannot process the subscription (e.g. no filter).
    #[error("event source unable to process: {0}")]
    EventSourceUnableToProcess(String),

    /// Malformed request or unknown subscription.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// The subscription exists but cannot be renewed.
    #[error("unable to renew: {0}")]
    UnableToRenew(String),
}

impl EventingFault {
    /// SOAP fault code: `Receiver` for source-side conditions, `Sender` otherwise.
    #[must_use]
    pub fn code(&self) -> FaultCode {
        match self {
            Self::EventSourceUnableToProcess(_) | Self::UnableToRenew(_) => FaultCode::Receiver,
            _ => FaultCode::Sender,
        }
    }

    /// Qualified fault subcode.
    #[must_use]
    pub fn subcode(&self) -> &'static str {
        match self {
            Self::DeliveryModeRequestedUnavailable(_) => "wse:DeliveryModeRequestedUnavailable",
            Self::InvalidExpirationTime(_) => "wse:InvalidExpirationTime",
            Self::FilteringRequestedUnavailable(_) => "wse:FilteringRequestedUnavailable",
            Self::FilterActionNotSupported(_) => "dpws:FilterActionNotSupported",
            Self::EventSourceUnableToProcess(_) => "wse:EventSourceUnableToProcess",
            Self::InvalidMessage(_) => "wsa:InvalidMessageInformationHeader",
            Self::UnableToRenew(_) => "wse:UnableToRenew",
        }
    }

    /// Human-readable reason.
    #[must_use]
    pub fn reason(&self) -> &str {
        match self {
            Self::DeliveryModeRequestedUnavailable(r)
            | Self::InvalidExpirationTime(r)
            | Self::FilteringRequestedUnavailable(r)
            | Self::FilterActionNotSupported(r)
            | Self::EventSourceUnableToProcess(r)
            | Self::InvalidMessage(r)
            | Self::UnableToRenew(r) => r,
        }
    }

    #[must_use]
    pub fn detail(&self) -> FaultDetail {
        FaultDetail {
            code: self.code(),
            subcode: self.subcode().to_string(),
            reason: self.reason().to_string(),
        }
    }

    /// Fault envelope answering `request`.
    #[must_use]
    pub fn to_envelope(&self, request: &Header) -> Envelope {
        Envelope::new(
            addressing::reply(request, WSA_FAULT_ACTION),
            Body::Fault(self.detail()),
        )
    }

    /// Reconstruct a fault received from a peer. Unknown subcodes become `InvalidMessage`.
    #[must_use]
    pub fn from_detail(detail: &FaultDetail) -> Self {
        let reason = detail.reason.clone();
        let local = detail
            .subcode
            .rsplit_once(':')
            .map_or(detail.subcode.as_str(), |(_, local)| local);
        match local {
            "DeliveryModeRequestedUnavailable" => Self::DeliveryModeRequestedUnavailable(reason),
            "InvalidExpirationTime" => Self::InvalidExpirationTime(reason),
            "FilteringRequestedUnavailable" => Self::FilteringRequestedUnavailable(reason),
            "FilterActionNotSupported" => Self::FilterActionNotSupported(reason),
            "EventSourceUnableToProcess" => Self::EventSourceUnableToProcess(reason),
            "UnableToRenew" => Self::UnableToRenew(reason),
            _ => Self::InvalidMessage(reason),
        }
    }
}
