//! Domain layer: local subscription proxies and sink errors.

pub mod error;
pub mod proxy;

pub use error::SinkError;
pub use proxy::{ProxyStore, SubscriptionProxy};
