//! Domain layer: subscription managers and the registry that indexes them.

pub mod manager;
pub mod registry;

pub use manager::{ManagerState, SourceSubscriptionManager, TerminationCause};
pub use registry::{RegistryError, RegistryObserver, SubscriptionRegistry};
