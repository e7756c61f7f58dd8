//! Ports layer.

pub mod outbound;

pub use outbound::NotificationCallback;
pub use wse_transport::{MessageHandler, Transport, TransportError};
