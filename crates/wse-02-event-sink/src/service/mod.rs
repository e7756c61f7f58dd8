//! Service layer: the event sink client.

mod renewal;
mod sink;

pub use sink::EventSink;
