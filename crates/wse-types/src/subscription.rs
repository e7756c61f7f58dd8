//! # Subscription Record
//!
//! The state shared by both ends of a subscription: identity, endpoints,
//! topic filter and lease. The lease is guarded by a read/write lock so that
//! status queries and sweeps can read it while a renew writes it.

use crate::addressing::EndpointReference;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::BTreeSet;
use uuid::Uuid;

/// Snapshot of a lease.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lease {
    /// Absolute deadline.
    pub expires_at: DateTime<Utc>,
    /// Length of the last grant.
    pub granted: chrono::Duration,
}

impl Lease {
    /// Leases past the representable range are pinned to its ends.
    fn starting_now(granted: chrono::Duration) -> Self {
        let expires_at = Utc::now()
            .checked_add_signed(granted)
            .unwrap_or(if granted < chrono::Duration::zero() {
                DateTime::<Utc>::MIN_UTC
            } else {
                DateTime::<Utc>::MAX_UTC
            });
        Self { expires_at, granted }
    }
}

/// One active lease.
#[derive(Debug)]
pub struct Subscription {
    id: String,
    notify_to: EndpointReference,
    end_to: Option<EndpointReference>,
    manager: EndpointReference,
    filter: BTreeSet<String>,
    lease: RwLock<Lease>,
}

impl Subscription {
    /// Create a subscription whose lease starts now.
    pub fn new(
        id: impl Into<String>,
        notify_to: EndpointReference,
        end_to: Option<EndpointReference>,
        manager: EndpointReference,
        filter: BTreeSet<String>,
        granted: chrono::Duration,
    ) -> Self {
        Self {
            id: id.into(),
            notify_to,
            end_to,
            manager,
            filter,
            lease: RwLock::new(Lease::starting_now(granted)),
        }
    }

    /// Fresh opaque subscription identifier.
    #[must_use]
    pub fn generate_id() -> String {
        Uuid::new_v4().to_string()
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn notify_to(&self) -> &EndpointReference {
        &self.notify_to
    }

    #[must_use]
    pub fn end_to(&self) -> Option<&EndpointReference> {
        self.end_to.as_ref()
    }

    /// Address at which this subscription is administered.
    #[must_use]
    pub fn manager(&self) -> &EndpointReference {
        &self.manager
    }

    /// Actions this subscription is interested in.
    #[must_use]
    pub fn filter(&self) -> &BTreeSet<String> {
        &self.filter
    }

    #[must_use]
    pub fn matches(&self, action: &str) -> bool {
        self.filter.contains(action)
    }

    /// Restart the lease: `expires_at = now + granted`.
    pub fn renew(&self, granted: chrono::Duration) {
        *self.lease.write() = Lease::starting_now(granted);
    }

    /// Time left on the lease. Negative once expired; never clamped.
    #[must_use]
    pub fn remaining_time(&self) -> chrono::Duration {
        self.lease.read().expires_at - Utc::now()
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.remaining_time() <= chrono::Duration::zero()
    }

    #[must_use]
    pub fn lease(&self) -> Lease {
        *self.lease.read()
    }

    #[must_use]
    pub fn granted_duration(&self) -> chrono::Duration {
        self.lease.read().granted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn subscription(granted: chrono::Duration) -> Subscription {
        Subscription::new(
            Subscription::generate_id(),
            EndpointReference::new("http://sink/notify"),
            None,
            EndpointReference::new("http://source/subscriptions/1"),
            BTreeSet::from(["urn:a".to_string()]),
            granted,
        )
    }

    fn close_to(actual: chrono::Duration, expected: chrono::Duration) -> bool {
        (actual - expected).num_milliseconds().abs() < 200
    }

    #[test]
    fn test_new_lease() {
        let sub = subscription(chrono::Duration::seconds(60));
        assert!(close_to(sub.remaining_time(), chrono::Duration::seconds(60)));
        assert_eq!(sub.granted_duration(), chrono::Duration::seconds(60));
        assert!(!sub.is_expired());
        assert!(sub.matches("urn:a"));
        assert!(!sub.matches("urn:b"));
    }

    #[test]
    fn test_renew_resets_remaining() {
        let sub = subscription(chrono::Duration::seconds(5));
        sub.renew(chrono::Duration::seconds(120));
        assert!(close_to(sub.remaining_time(), chrono::Duration::seconds(120)));
        assert_eq!(sub.granted_duration(), chrono::Duration::seconds(120));
    }

    #[test]
    fn test_remaining_time_negative_when_expired() {
        let sub = subscription(chrono::Duration::seconds(-3));
        assert!(sub.remaining_time() < chrono::Duration::zero());
        assert!(close_to(sub.remaining_time(), chrono::Duration::seconds(-3)));
        assert!(sub.is_expired());
    }

    #[test]
    fn test_out_of_range_lease_is_pinned() {
        let huge = chrono::Duration::days(100_000_000);
        let sub = subscription(huge);
        assert_eq!(sub.lease().expires_at, DateTime::<Utc>::MAX_UTC);
        assert_eq!(sub.granted_duration(), huge);
        assert!(!sub.is_expired());

        sub.renew(-huge);
        assert_eq!(sub.lease().expires_at, DateTime::<Utc>::MIN_UTC);
        assert!(sub.is_expired());
    }

    #[test]
    fn test_concurrent_renew_and_read() {
        let sub = Arc::new(subscription(chrono::Duration::seconds(10)));
        let writer = {
            let sub = sub.clone();
            std::thread::spawn(move || {
                for _ in 0..1000 {
                    sub.renew(chrono::Duration::seconds(30));
                }
            })
        };
        for _ in 0..1000 {
            let lease = sub.lease();
            assert!(
                lease.granted == chrono::Duration::seconds(10)
                    || lease.granted == chrono::Duration::seconds(30)
            );
        }
        writer.join().unwrap();
        assert_eq!(sub.granted_duration(), chrono::Duration::seconds(30));
    }
}
