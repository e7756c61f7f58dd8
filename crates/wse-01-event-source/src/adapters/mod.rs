//! Adapters layer: transport endpoints and registry observers.

pub mod context;
pub mod endpoints;

pub use context::ContextReleaser;
pub use endpoints::{ManagerEndpoint, SourceEndpoint};
