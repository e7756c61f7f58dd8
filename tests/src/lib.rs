//! # WS-Eventing Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/          # Dispatch and fan-out benchmarks
//! └── src/integration/  # Event sink ↔ event source over one transport
//!     ├── flows.rs          # Subscribe, notify, renew, status, unsubscribe
//!     └── choreography.rs   # Shutdown, cancellation, delivery loss, expiry
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p wse-tests
//! cargo test -p wse-tests integration::choreography::
//!
//! # Benchmarks
//! cargo bench -p wse-tests
//! ```

pub mod integration;
