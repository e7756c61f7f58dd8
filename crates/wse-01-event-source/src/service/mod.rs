//! Service layer: protocol handling for the event source.

pub mod messages;
mod source;
pub mod validation;

pub use source::EventSource;
