//! Releases a subscription's manager context when it leaves the registry.

use crate::config::EventSourceConfig;
use crate::domain::{RegistryObserver, SourceSubscriptionManager};
use std::sync::Arc;
use tracing::debug;
use wse_transport::Transport;

pub struct ContextReleaser {
    transport: Arc<dyn Transport>,
    config: EventSourceConfig,
}

impl ContextReleaser {
    pub fn new(transport: Arc<dyn Transport>, config: EventSourceConfig) -> Self {
        Self { transport, config }
    }
}

impl RegistryObserver for ContextReleaser {
    fn on_removed(&self, manager: &Arc<SourceSubscriptionManager>) {
        let path = self.config.manager_path(manager.id());
        if self.transport.unregister_context(&self.config.base_address, &path) {
            debug!(subscription_id = %manager.id(), %path, "Manager context released");
        }
    }
}
