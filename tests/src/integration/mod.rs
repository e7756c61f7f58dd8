//! Cross-crate flows between `wse-02-event-sink` and `wse-01-event-source`.

pub mod choreography;
pub mod flows;

#[cfg(test)]
mod support;
