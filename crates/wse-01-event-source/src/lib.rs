//! # WS-Eventing Event Source
//!
//! Accepts subscriptions, keeps their leases, and pushes notifications to
//! every subscriber whose action filter matches.
//!
//! ## Invariants
//!
//! | Invariant | Enforcement Location |
//! |-----------|---------------------|
//! | Granted lease = min(requested, configured max) | `service/validation.rs` - `grant_expires()` |
//! | Id index and action index change together | `domain/registry.rs` - single `Mutex<Indices>` |
//! | One slow sink never blocks the others | `domain/manager.rs` - `offer_notification()` uses `try_send` |
//! | FIFO delivery per subscription | `domain/manager.rs` - one worker per bounded queue |
//! | Manager contexts live exactly as long as registry entries | `adapters/context.rs` - `ContextReleaser` |
//!
//! ## Subscription Lifecycle
//!
//! ```text
//! Subscribe ──→ [ACTIVE] ──Renew──→ [ACTIVE]
//!                  │
//!                  ├── Unsubscribe ───────────→ [TERMINATED]  (worker awaited)
//!                  ├── push failed / overflow ─→ [TERMINATED]  (SubscriptionEnd: DeliveryFailure)
//!                  ├── lease elapsed ─────────→ evicted by sweep
//!                  └── source shutdown ───────→ [TERMINATED]  (SubscriptionEnd: SourceShuttingDown)
//! ```
//!
//! ## Module Structure (Hexagonal Architecture)
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  adapters/ - transport endpoints, ContextReleaser observer       │
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ implements ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  ports/inbound.rs - EventSourceApi                              │
//! │  wse-transport    - Transport, MessageHandler                   │
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ uses ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  service/ - EventSource protocol handler, validation, messages  │
//! │  domain/  - SourceSubscriptionManager, SubscriptionRegistry     │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod service;

pub use config::{ConfigError, EventSourceConfig};
pub use domain::{
    ManagerState, RegistryError, RegistryObserver, SourceSubscriptionManager, SubscriptionRegistry,
    TerminationCause,
};
pub use ports::EventSourceApi;
pub use service::EventSource;
