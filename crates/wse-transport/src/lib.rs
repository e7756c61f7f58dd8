//! # WS-Eventing Transport
//!
//! The seam between the eventing engine and whatever carries its messages.
//!
//! ```text
//! ┌──────────────┐  send_request_response()  ┌──────────────┐
//! │ Event Sink   │ ────────────────────────→ │ Event Source │
//! │              │                           │              │
//! │ push context │ ←──────────────────────── │  delivery    │
//! └──────────────┘      send_one_way()       └──────────────┘
//! ```
//!
//! Both sides register *contexts* (address → handler) for the endpoints they
//! serve: the source for its subscription managers, the sink for its push
//! endpoints. `InMemoryTransport` is the reference implementation used by the
//! test suite and the demo node.

#![allow(clippy::missing_const_for_fn)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod memory;
pub mod ports;

pub use memory::InMemoryTransport;
pub use ports::{MessageHandler, Transport, TransportError};
