//! Adapters layer: push endpoints served through the transport.

pub mod push;

pub use push::{PushBinding, PushEndpoint, PushKind};
