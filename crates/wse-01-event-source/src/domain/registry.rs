//! # Subscription Registry
//!
//! Id index and action index over the live subscription managers.
//!
//! Both indices sit behind a single lock, so a lookup never observes a
//! subscription present in one index and missing from the other. Observers
//! are notified after the lock is released.

use super::manager::{SourceSubscriptionManager, TerminationCause};
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};
use wse_telemetry::SUBSCRIPTIONS_ACTIVE;

/// Registry errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("subscription already registered: {0}")]
    DuplicateSubscription(String),
}

/// Hook for reacting to registry membership changes.
pub trait RegistryObserver: Send + Sync {
    fn on_added(&self, _manager: &Arc<SourceSubscriptionManager>) {}

    fn on_removed(&self, manager: &Arc<SourceSubscriptionManager>);
}

#[derive(Default)]
struct Indices {
    by_id: HashMap<String, Arc<SourceSubscriptionManager>>,
    by_action: HashMap<String, HashSet<String>>,
}

impl Indices {
    fn unindex(&mut self, id: &str) -> Option<Arc<SourceSubscriptionManager>> {
        let manager = self.by_id.remove(id)?;
        for action in manager.subscription().filter() {
            if let Some(ids) = self.by_action.get_mut(action) {
                ids.remove(id);
                if ids.is_empty() {
                    self.by_action.remove(action);
                }
            }
        }
        Some(manager)
    }
}

/// Live subscriptions of one event source.
#[derive(Default)]
pub struct SubscriptionRegistry {
    indices: Mutex<Indices>,
    observers: RwLock<Vec<Arc<dyn RegistryObserver>>>,
}

impl SubscriptionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_observer(&self, observer: Arc<dyn RegistryObserver>) {
        self.observers.write().push(observer);
    }

    /// Index `manager` under its id and every action of its filter.
    pub fn add(&self, manager: Arc<SourceSubscriptionManager>) -> Result<(), RegistryError> {
        let count = {
            let mut indices = self.indices.lock();
            let id = manager.id().to_string();
            if indices.by_id.contains_key(&id) {
                return Err(RegistryError::DuplicateSubscription(id));
            }
            for action in manager.subscription().filter() {
                indices
                    .by_action
                    .entry(action.clone())
                    .or_default()
                    .insert(id.clone());
            }
            indices.by_id.insert(id, Arc::clone(&manager));
            indices.by_id.len()
        };

        SUBSCRIPTIONS_ACTIVE.set(count as f64);
        debug!(subscription_id = %manager.id(), active = count, "Subscription registered");
        for observer in self.observers.read().iter() {
            observer.on_added(&manager);
        }
        Ok(())
    }

    /// Remove one subscription from both indices and stop it with `cause`.
    ///
    /// The manager is halted before the lock is released, so a dispatcher
    /// holding a stale match cannot enqueue to it afterwards.
    pub fn remove(&self, id: &str, cause: TerminationCause) -> Option<Arc<SourceSubscriptionManager>> {
        let (removed, count) = {
            let mut indices = self.indices.lock();
            let removed = indices.unindex(id)?;
            removed.shutdown(cause);
            (removed, indices.by_id.len())
        };

        SUBSCRIPTIONS_ACTIVE.set(count as f64);
        self.notify_removed(std::slice::from_ref(&removed));
        Some(removed)
    }

    /// Empty the registry, stopping every manager with `cause` under the lock.
    pub fn remove_all(&self, cause: TerminationCause) -> Vec<Arc<SourceSubscriptionManager>> {
        let removed: Vec<_> = {
            let mut indices = self.indices.lock();
            indices.by_action.clear();
            indices
                .by_id
                .drain()
                .map(|(_, manager)| manager)
                .inspect(|manager| manager.shutdown(cause))
                .collect()
        };

        SUBSCRIPTIONS_ACTIVE.set(0.0);
        self.notify_removed(&removed);
        removed
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<Arc<SourceSubscriptionManager>> {
        self.indices.lock().by_id.get(id).cloned()
    }

    #[must_use]
    pub fn all(&self) -> Vec<Arc<SourceSubscriptionManager>> {
        self.indices.lock().by_id.values().cloned().collect()
    }

    /// Managers whose filter contains `action`.
    #[must_use]
    pub fn subscribers_of(&self, action: &str) -> Vec<Arc<SourceSubscriptionManager>> {
        let indices = self.indices.lock();
        indices
            .by_action
            .get(action)
            .map(|ids| ids.iter().filter_map(|id| indices.by_id.get(id).cloned()).collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.indices.lock().by_id.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Evict every subscription that is no longer running or whose lease has
    /// run out. Expired managers are stopped while still under the lock, so a
    /// concurrent dispatch cannot enqueue to them after eviction.
    pub fn sweep(&self) -> Vec<Arc<SourceSubscriptionManager>> {
        let (evicted, count) = {
            let mut indices = self.indices.lock();
            let stale: Vec<String> = indices
                .by_id
                .values()
                .filter(|m| !m.is_running() || m.subscription().is_expired())
                .map(|m| m.id().to_string())
                .collect();

            let evicted: Vec<_> = stale
                .iter()
                .filter_map(|id| indices.unindex(id))
                .inspect(|m| m.shutdown(TerminationCause::Expired))
                .collect();
            (evicted, indices.by_id.len())
        };

        if !evicted.is_empty() {
            SUBSCRIPTIONS_ACTIVE.set(count as f64);
            info!(evicted = evicted.len(), remaining = count, "Swept stale subscriptions");
            self.notify_removed(&evicted);
        }
        evicted
    }

    fn notify_removed(&self, removed: &[Arc<SourceSubscriptionManager>]) {
        let observers = self.observers.read();
        for manager in removed {
            for observer in observers.iter() {
                observer.on_removed(manager);
            }
        }
    }
}
