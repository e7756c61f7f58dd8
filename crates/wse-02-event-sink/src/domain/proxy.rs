//! # Sink-Side Subscription Proxies
//!
//! Local view of each subscription this sink holds at a remote source.

use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::task::JoinHandle;
use wse_types::{Expires, Subscription};

/// Local state for one remote subscription.
#[derive(Debug)]
pub struct SubscriptionProxy {
    subscription: Subscription,
    /// Lease asked for at subscribe time; reused by auto-renewal.
    requested: Option<Expires>,
    notify_path: String,
    end_path: String,
    renewer: Mutex<Option<JoinHandle<()>>>,
}

impl SubscriptionProxy {
    pub fn new(
        subscription: Subscription,
        requested: Option<Expires>,
        notify_path: String,
        end_path: String,
    ) -> Self {
        Self {
            subscription,
            requested,
            notify_path,
            end_path,
            renewer: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        self.subscription.id()
    }

    #[must_use]
    pub fn subscription(&self) -> &Subscription {
        &self.subscription
    }

    #[must_use]
    pub fn requested(&self) -> Option<&Expires> {
        self.requested.as_ref()
    }

    /// Context paths of the notify and end push endpoints.
    #[must_use]
    pub fn push_paths(&self) -> [&str; 2] {
        [self.notify_path.as_str(), self.end_path.as_str()]
    }

    pub fn set_renewer(&self, handle: JoinHandle<()>) {
        if let Some(previous) = self.renewer.lock().replace(handle) {
            previous.abort();
        }
    }

    /// Stop auto-renewal, if running.
    pub fn cancel_renewer(&self) {
        if let Some(handle) = self.renewer.lock().take() {
            handle.abort();
        }
    }

    #[must_use]
    pub fn has_renewer(&self) -> bool {
        self.renewer.lock().as_ref().is_some_and(|h| !h.is_finished())
    }
}

/// Proxies keyed by subscription id.
#[derive(Debug, Default)]
pub struct ProxyStore {
    proxies: DashMap<String, Arc<SubscriptionProxy>>,
}

impl ProxyStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, proxy: Arc<SubscriptionProxy>) {
        self.proxies.insert(proxy.id().to_string(), proxy);
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<Arc<SubscriptionProxy>> {
        self.proxies.get(id).map(|entry| Arc::clone(entry.value()))
    }

    pub fn remove(&self, id: &str) -> Option<Arc<SubscriptionProxy>> {
        self.proxies.remove(id).map(|(_, proxy)| proxy)
    }

    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        self.proxies.iter().map(|entry| entry.key().clone()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.proxies.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.proxies.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use wse_types::EndpointReference;

    fn proxy(id: &str) -> Arc<SubscriptionProxy> {
        Arc::new(SubscriptionProxy::new(
            Subscription::new(
                id,
                EndpointReference::new("http://sink/notify"),
                Some(EndpointReference::new("http://sink/end")),
                EndpointReference::new(format!("http://source/subscriptions/{id}")),
                BTreeSet::new(),
                chrono::Duration::seconds(60),
            ),
            Some(Expires::seconds(60)),
            format!("/sink/{id}/notify"),
            format!("/sink/{id}/end"),
        ))
    }

    #[test]
    fn test_store_operations() {
        let store = ProxyStore::new();
        store.insert(proxy("a"));
        store.insert(proxy("b"));

        assert_eq!(store.len(), 2);
        assert_eq!(store.get("a").unwrap().push_paths(), ["/sink/a/notify", "/sink/a/end"]);

        let mut ids = store.ids();
        ids.sort();
        assert_eq!(ids, vec!["a".to_string(), "b".to_string()]);

        assert!(store.remove("a").is_some());
        assert!(store.remove("a").is_none());
        assert!(store.get("a").is_none());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_renewer_cancelled() {
        let proxy = proxy("a");
        proxy.set_renewer(tokio::spawn(std::future::pending::<()>()));
        assert!(proxy.has_renewer());

        proxy.cancel_renewer();
        assert!(!proxy.has_renewer());
    }
}
