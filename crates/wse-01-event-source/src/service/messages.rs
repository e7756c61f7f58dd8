//! Outgoing message construction.

use wse_types::addressing;
use wse_types::constants::ACTION_SUBSCRIPTION_END;
use wse_types::{Body, Envelope, Subscription, SubscriptionEnd};

/// Notification addressed to the subscription's NotifyTo endpoint.
pub fn notification(subscription: &Subscription, action: &str, payload: &serde_json::Value) -> Envelope {
    Envelope::new(
        addressing::to_epr(subscription.notify_to(), action),
        Body::Notification(payload.clone()),
    )
}

/// SubscriptionEnd addressed to the subscription's EndTo endpoint, if it has one.
pub fn subscription_end(
    subscription: &Subscription,
    status: &str,
    reason: Option<&str>,
) -> Option<Envelope> {
    let end_to = subscription.end_to()?;
    Some(Envelope::new(
        addressing::to_epr(end_to, ACTION_SUBSCRIPTION_END),
        Body::SubscriptionEnd(SubscriptionEnd {
            subscription_manager: subscription.manager().clone(),
            status: status.to_string(),
            reason: reason.map(str::to_string),
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use wse_types::constants::STATUS_SOURCE_SHUTTING_DOWN;
    use wse_types::{EndpointReference, ReferenceParameter};

    fn subscription(end_to: Option<EndpointReference>) -> Subscription {
        Subscription::new(
            "sub-1",
            EndpointReference::new("http://sink/notify")
                .with_parameter(ReferenceParameter::new("urn:sink", "Token", "t-1")),
            end_to,
            EndpointReference::new("http://source/subscriptions/sub-1")
                .with_parameter(ReferenceParameter::identifier("sub-1")),
            BTreeSet::new(),
            chrono::Duration::seconds(60),
        )
    }

    #[test]
    fn test_notification_carries_reference_parameters() {
        let message = notification(&subscription(None), "urn:a", &serde_json::json!({"v": 1}));
        assert_eq!(message.header.to, "http://sink/notify");
        assert_eq!(message.action(), "urn:a");
        assert_eq!(message.header.reference_parameters.len(), 1);
        assert_eq!(message.header.reference_parameters[0].value, "t-1");
        assert_eq!(message.body, Body::Notification(serde_json::json!({"v": 1})));
    }

    #[test]
    fn test_subscription_end_requires_end_to() {
        assert!(subscription_end(&subscription(None), STATUS_SOURCE_SHUTTING_DOWN, None).is_none());

        let sub = subscription(Some(EndpointReference::new("http://sink/end")));
        let message = subscription_end(&sub, STATUS_SOURCE_SHUTTING_DOWN, Some("bye")).unwrap();
        assert_eq!(message.header.to, "http://sink/end");
        assert_eq!(message.action(), ACTION_SUBSCRIPTION_END);
        match message.body {
            Body::SubscriptionEnd(end) => {
                assert_eq!(end.status, STATUS_SOURCE_SHUTTING_DOWN);
                assert_eq!(end.reason.as_deref(), Some("bye"));
                assert_eq!(end.subscription_manager.identifier(), Some("sub-1"));
            }
            other => panic!("unexpected body {}", other.name()),
        }
    }
}
