//! Ports layer: the API the host drives and the transport the source drives.

pub mod inbound;

pub use inbound::EventSourceApi;
pub use wse_transport::{MessageHandler, Transport, TransportError};
