//! # WS-Eventing Types
//!
//! Shared vocabulary of the event source and the event sink.
//!
//! ## Contents
//!
//! - `constants` - namespace URIs, actions, delivery mode, filter dialect, end statuses
//! - `addressing` - endpoint references and header construction
//! - `envelope` - the typed message exchanged with the transport
//! - `expires` - `xs:duration` / timestamp lease expressions
//! - `fault` - protocol fault taxonomy and fault envelopes
//! - `subscription` - the symmetric subscription record with its lease

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod addressing;
pub mod constants;
pub mod envelope;
pub mod expires;
pub mod fault;
pub mod subscription;

pub use addressing::{EndpointReference, ReferenceParameter};
pub use envelope::{
    Body, Envelope, FaultCode, FaultDetail, Filter, Header, SubscribeRequest, SubscriptionEnd,
};
pub use expires::{Expires, ExpiresParseError};
pub use fault::EventingFault;
pub use subscription::{Lease, Subscription};
