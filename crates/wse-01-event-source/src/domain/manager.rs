//! # Source-Side Subscription Manager
//!
//! Owns one subscription's bounded delivery queue and the task draining it.
//!
//! ```text
//! [CREATED] ──start──→ [ACTIVE] ──unsubscribe / overflow / failure / expiry──→ [STOPPING]
//!                                                                                  │
//!                                                     worker drains and exits ──→ [TERMINATED]
//! ```
//!
//! The worker is woken for shutdown by dropping the queue's sender. Anything
//! still buffered when the manager leaves ACTIVE is discarded, never sent.

use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use wse_telemetry::{
    metric_inc, DELIVERY_FAILURES, NOTIFICATIONS_DELIVERED, NOTIFICATIONS_OFFERED, QUEUE_OVERFLOWS,
};
use wse_transport::Transport;
use wse_types::{Envelope, Subscription};

/// Lifecycle state of a manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerState {
    Created,
    Active,
    Stopping,
    Terminated,
}

/// Why a manager left ACTIVE. The first cause recorded wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationCause {
    /// The sink unsubscribed.
    Unsubscribed,
    /// A push to the sink failed.
    DeliveryFailure,
    /// The sink fell `queue_capacity` notifications behind.
    QueueOverflow,
    /// The lease ran out.
    Expired,
    /// The source shut down or cancelled the subscription.
    SourceShutdown,
}

impl TerminationCause {
    /// Whether the sink should be told about the loss with a
    /// DeliveryFailure SubscriptionEnd.
    #[must_use]
    pub fn is_delivery_loss(self) -> bool {
        matches!(self, Self::DeliveryFailure | Self::QueueOverflow)
    }
}

/// State shared between the manager and its worker.
#[derive(Debug)]
struct Control {
    state: ManagerState,
    cause: Option<TerminationCause>,
    /// Producer side of the queue. `None` once stopping; dropping it wakes the worker.
    queue: Option<mpsc::Sender<Envelope>>,
}

impl Control {
    fn halt(&mut self, cause: TerminationCause) -> bool {
        match self.state {
            ManagerState::Created | ManagerState::Active => {
                self.state = ManagerState::Stopping;
                self.cause.get_or_insert(cause);
                self.queue = None;
                true
            }
            ManagerState::Stopping | ManagerState::Terminated => {
                self.cause.get_or_insert(cause);
                false
            }
        }
    }
}

/// Server-side handle for one subscription.
pub struct SourceSubscriptionManager {
    subscription: Subscription,
    transport: Arc<dyn Transport>,
    capacity: usize,
    control: Arc<Mutex<Control>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for SourceSubscriptionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceSubscriptionManager")
            .field("id", &self.subscription.id())
            .field("state", &self.state())
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl SourceSubscriptionManager {
    /// Create a manager in CREATED. `capacity` is clamped to at least one.
    pub fn new(subscription: Subscription, transport: Arc<dyn Transport>, capacity: usize) -> Self {
        Self {
            subscription,
            transport,
            capacity: capacity.max(1),
            control: Arc::new(Mutex::new(Control {
                state: ManagerState::Created,
                cause: None,
                queue: None,
            })),
            worker: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn subscription(&self) -> &Subscription {
        &self.subscription
    }

    #[must_use]
    pub fn id(&self) -> &str {
        self.subscription.id()
    }

    #[must_use]
    pub fn state(&self) -> ManagerState {
        self.control.lock().state
    }

    #[must_use]
    pub fn termination_cause(&self) -> Option<TerminationCause> {
        self.control.lock().cause
    }

    /// True exactly while ACTIVE.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state() == ManagerState::Active
    }

    /// Open the queue and spawn the delivery worker. Only the first call has
    /// any effect. Must be called from within a Tokio runtime.
    pub fn start(&self) {
        let mut control = self.control.lock();
        if control.state != ManagerState::Created {
            return;
        }

        let (sender, receiver) = mpsc::channel(self.capacity);
        control.queue = Some(sender);
        control.state = ManagerState::Active;

        let handle = tokio::spawn(deliver(
            receiver,
            Arc::clone(&self.transport),
            Arc::clone(&self.control),
            self.subscription.id().to_string(),
        ));
        *self.worker.lock() = Some(handle);

        debug!(subscription_id = %self.subscription.id(), capacity = self.capacity, "Delivery worker started");
    }

    /// Enqueue one notification without blocking.
    ///
    /// Returns `false` if the manager is not ACTIVE or the queue was full. A
    /// full queue stops the manager with [`TerminationCause::QueueOverflow`].
    pub fn offer_notification(&self, message: Envelope) -> bool {
        let mut control = self.control.lock();
        if control.state != ManagerState::Active {
            return false;
        }
        let Some(queue) = control.queue.as_ref() else {
            return false;
        };

        match queue.try_send(message) {
            Ok(()) => {
                metric_inc!(NOTIFICATIONS_OFFERED);
                true
            }
            Err(TrySendError::Full(_)) => {
                warn!(
                    subscription_id = %self.subscription.id(),
                    capacity = self.capacity,
                    "Delivery queue full, shedding subscription"
                );
                metric_inc!(QUEUE_OVERFLOWS);
                control.halt(TerminationCause::QueueOverflow);
                false
            }
            Err(TrySendError::Closed(_)) => {
                control.halt(TerminationCause::DeliveryFailure);
                false
            }
        }
    }

    /// Request a stop without waiting for the worker.
    pub fn shutdown(&self, cause: TerminationCause) {
        if self.control.lock().halt(cause) {
            debug!(subscription_id = %self.subscription.id(), ?cause, "Subscription stopping");
        }
    }

    /// Stop and wait until any in-flight delivery has completed.
    pub async fn stop(&self, cause: TerminationCause) {
        self.shutdown(cause);
        let handle = self.worker.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                if !e.is_cancelled() {
                    warn!(subscription_id = %self.subscription.id(), error = %e, "Delivery worker panicked");
                }
            }
        }
    }

    /// Stop and interrupt the worker, abandoning any in-flight delivery.
    pub fn abort(&self, cause: TerminationCause) {
        self.shutdown(cause);
        if let Some(handle) = self.worker.lock().take() {
            handle.abort();
        }
        self.control.lock().state = ManagerState::Terminated;
    }

    /// Send a SubscriptionEnd message to the EndTo endpoint in the background.
    ///
    /// Failures are logged and otherwise ignored.
    pub fn send_end_to(&self, message: Envelope) -> JoinHandle<()> {
        let transport = Arc::clone(&self.transport);
        let subscription_id = self.subscription.id().to_string();
        tokio::spawn(async move {
            let address = message.header.to.clone();
            match transport.send_one_way(message).await {
                Ok(()) => debug!(%subscription_id, %address, "SubscriptionEnd delivered"),
                Err(e) => warn!(%subscription_id, %address, error = %e, "SubscriptionEnd not delivered"),
            }
        })
    }
}

/// Drain the queue until the sender is dropped or a push fails.
async fn deliver(
    mut queue: mpsc::Receiver<Envelope>,
    transport: Arc<dyn Transport>,
    control: Arc<Mutex<Control>>,
    subscription_id: String,
) {
    let mut delivered = 0u64;
    while let Some(message) = queue.recv().await {
        if control.lock().state != ManagerState::Active {
            // Stopped: drain without sending.
            continue;
        }

        match transport.send_one_way(message).await {
            Ok(()) => {
                delivered += 1;
                metric_inc!(NOTIFICATIONS_DELIVERED);
            }
            Err(e) => {
                warn!(%subscription_id, error = %e, "Notification delivery failed, stopping subscription");
                metric_inc!(DELIVERY_FAILURES);
                control.lock().halt(TerminationCause::DeliveryFailure);
                break;
            }
        }
    }

    let mut control = control.lock();
    control.state = ManagerState::Terminated;
    control.queue = None;
    info!(%subscription_id, delivered, cause = ?control.cause, "Delivery worker exited");
}
