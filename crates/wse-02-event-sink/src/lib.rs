//! # WS-Eventing Event Sink
//!
//! Client side of WS-Eventing: subscribes to event sources, renews and
//! cancels those subscriptions, and receives the notifications they push.
//!
//! ## Push Endpoints
//!
//! Every subscription gets two transport contexts of its own:
//!
//! | Context | Path | Accepts |
//! |---------|------|---------|
//! | NotifyTo | `{push_path_prefix}/{uuid}/notify` | Notifications, passed to `NotificationCallback::on_notification` |
//! | EndTo | `{push_path_prefix}/{uuid}/end` | SubscriptionEnd; local state is dropped, then `on_subscription_end` |
//!
//! ## Failure Handling
//!
//! - Every request/response exchange is bounded by `request_timeout_ms`.
//! - Faults from the source come back as [`SinkError::Fault`].
//! - [`EventSink::unsubscribe_all`] is best effort within `shutdown_timeout_ms`
//!   and always leaves the sink empty.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod service;

pub use config::{ConfigError, EventSinkConfig};
pub use domain::{SinkError, SubscriptionProxy};
pub use ports::NotificationCallback;
pub use service::EventSink;
