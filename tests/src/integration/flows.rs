//! # Subscription Flows
//!
//! An [`EventSink`](wse_02_event_sink::EventSink) managing subscriptions at an
//! [`EventSource`](wse_01_event_source::EventSource) over one in-memory transport.
//!
//! ```text
//! [EventSink] ──Subscribe──────────→ [EventSource /events]
//!      ↑                                   │ registers
//!      │                                   ↓
//!      │ ←──Notification (NotifyTo)── [Manager /subscriptions/{id}]
//!      │ ──Renew/GetStatus/Unsubscribe──→  │
//! ```
//!
//! ## Test Categories
//!
//! 1. **Happy Path**: subscribe, receive in order, unsubscribe
//! 2. **Topic Routing**: only matching actions reach a subscriber
//! 3. **Lease Management**: renew and status through the sink API
//! 4. **Fault Mapping**: source faults surface as `SinkError::Fault`

#[cfg(test)]
mod tests {
    use super::super::support::*;
    use chrono::Duration as ChronoDuration;
    use serde_json::json;
    use std::sync::Arc;
    use wse_01_event_source::{EventSourceApi, EventSourceConfig};
    use wse_02_event_sink::{EventSinkConfig, SinkError};
    use wse_types::{EventingFault, Expires, Filter};

    // =========================================================================
    // HAPPY PATH
    // =========================================================================

    #[tokio::test]
    async fn test_notifications_arrive_in_publish_order() {
        let net = Network::new();
        let recorder = Arc::new(Recorder::default());
        let (id, _) = net
            .sink
            .subscribe_actions(&net.source_address(), [TEMPERATURE], None, recorder.clone())
            .await
            .unwrap();

        for reading in 1..=5 {
            assert_eq!(net.source.send_notification(TEMPERATURE, json!({ "celsius": reading })), 1);
        }
        eventually("five notifications", || recorder.count() == 5).await;

        let readings: Vec<_> = recorder
            .payloads()
            .iter()
            .map(|p| p["celsius"].as_i64().unwrap())
            .collect();
        assert_eq!(readings, vec![1, 2, 3, 4, 5]);
        assert!(recorder
            .notifications
            .lock()
            .iter()
            .all(|(sub, action, _)| sub == &id && action == TEMPERATURE));
    }

    #[tokio::test]
    async fn test_subscription_ids_agree_on_both_sides() {
        let net = Network::new();
        let baseline = net.transport.context_count();
        let (id, granted) = net
            .sink
            .subscribe_actions(
                &net.source_address(),
                [TEMPERATURE],
                Some(Expires::seconds(300)),
                Arc::new(Recorder::default()),
            )
            .await
            .unwrap();

        assert_eq!(granted, Expires::Duration(ChronoDuration::seconds(300)));
        assert!(net.source.subscription(&id).is_some());
        assert!(net.sink.subscription(&id).is_some());
        // manager context at the source, NotifyTo and EndTo at the sink
        assert_eq!(net.transport.context_count(), baseline + 3);
    }

    // =========================================================================
    // TOPIC ROUTING
    // =========================================================================

    #[tokio::test]
    async fn test_only_matching_actions_are_delivered() {
        let net = Network::new();
        let temperature = Arc::new(Recorder::default());
        let both = Arc::new(Recorder::default());
        let source = net.source_address();
        net.sink
            .subscribe_actions(&source, [TEMPERATURE], None, temperature.clone())
            .await
            .unwrap();
        net.sink
            .subscribe_actions(&source, [TEMPERATURE, HUMIDITY], None, both.clone())
            .await
            .unwrap();

        assert_eq!(net.source.send_notification(HUMIDITY, json!({ "percent": 40 })), 1);
        assert_eq!(net.source.send_notification(TEMPERATURE, json!({ "celsius": 21 })), 2);
        assert_eq!(net.source.send_notification("http://example.org/sensor/Pressure", json!({})), 0);

        eventually("fan-out", || temperature.count() == 1 && both.count() == 2).await;
        assert_eq!(temperature.notifications.lock()[0].1, TEMPERATURE);
    }

    // =========================================================================
    // LEASE MANAGEMENT
    // =========================================================================

    #[tokio::test]
    async fn test_renew_then_get_status() {
        let net = Network::new();
        let (id, _) = net
            .sink
            .subscribe_actions(
                &net.source_address(),
                [TEMPERATURE],
                Some(Expires::seconds(60)),
                Arc::new(Recorder::default()),
            )
            .await
            .unwrap();

        let renewed = net.sink.renew(&id, Some(Expires::seconds(600))).await.unwrap();
        assert_eq!(renewed, Expires::Duration(ChronoDuration::seconds(600)));

        match net.sink.get_status(&id).await.unwrap() {
            Expires::Duration(remaining) => {
                assert!(remaining <= ChronoDuration::seconds(600));
                assert!(remaining > ChronoDuration::seconds(590));
            }
            other => panic!("expected a duration, got {other}"),
        }

        let local = net.sink.subscription(&id).unwrap();
        assert!(local.subscription().remaining_time() > ChronoDuration::seconds(590));
    }

    #[tokio::test]
    async fn test_renew_is_capped_at_source_maximum() {
        let source_config = EventSourceConfig {
            max_expires_secs: 120,
            ..Default::default()
        };
        let net = Network::with_configs(source_config, EventSinkConfig::default());
        let (id, granted) = net
            .sink
            .subscribe_actions(&net.source_address(), [TEMPERATURE], None, Arc::new(Recorder::default()))
            .await
            .unwrap();
        assert_eq!(granted, Expires::Duration(ChronoDuration::seconds(120)));

        let renewed = net.sink.renew(&id, Some(Expires::seconds(7200))).await.unwrap();
        assert_eq!(renewed, Expires::Duration(ChronoDuration::seconds(120)));
    }

    // =========================================================================
    // UNSUBSCRIBE
    // =========================================================================

    #[tokio::test]
    async fn test_unsubscribe_stops_delivery_and_frees_contexts() {
        let net = Network::new();
        let baseline = net.transport.context_count();
        let recorder = Arc::new(Recorder::default());
        let (id, _) = net
            .sink
            .subscribe_actions(&net.source_address(), [TEMPERATURE], None, recorder.clone())
            .await
            .unwrap();

        net.source.send_notification(TEMPERATURE, json!({ "celsius": 1 }));
        eventually("first notification", || recorder.count() == 1).await;

        net.sink.unsubscribe(&id).await.unwrap();
        assert_eq!(net.source.subscription_count(), 0);
        assert_eq!(net.sink.subscription_count(), 0);
        assert_eq!(net.transport.context_count(), baseline);

        assert_eq!(net.source.send_notification(TEMPERATURE, json!({ "celsius": 2 })), 0);
        assert!(recorder.ends().is_empty());
        assert!(matches!(
            net.sink.renew(&id, None).await,
            Err(SinkError::SubscriptionNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_unsubscribe_all_clears_both_sides() {
        let net = Network::new();
        let baseline = net.transport.context_count();
        let source = net.source_address();
        for action in [TEMPERATURE, HUMIDITY, TEMPERATURE] {
            net.sink
                .subscribe_actions(&source, [action], None, Arc::new(Recorder::default()))
                .await
                .unwrap();
        }
        assert_eq!(net.source.subscription_count(), 3);

        assert_eq!(net.sink.unsubscribe_all().await, 3);
        assert_eq!(net.source.subscription_count(), 0);
        assert_eq!(net.sink.subscription_count(), 0);
        assert_eq!(net.transport.context_count(), baseline);
    }

    // =========================================================================
    // FAULT MAPPING
    // =========================================================================

    #[tokio::test]
    async fn test_unoffered_action_is_rejected_without_residue() {
        let source_config = EventSourceConfig {
            offered_actions: vec![TEMPERATURE.to_string()],
            ..Default::default()
        };
        let net = Network::with_configs(source_config, EventSinkConfig::default());
        let baseline = net.transport.context_count();

        let result = net
            .sink
            .subscribe_actions(&net.source_address(), [HUMIDITY], None, Arc::new(Recorder::default()))
            .await;
        assert!(matches!(
            result,
            Err(SinkError::Fault(EventingFault::FilterActionNotSupported(_)))
        ));
        assert_eq!(net.source.subscription_count(), 0);
        assert_eq!(net.sink.subscription_count(), 0);
        assert_eq!(net.transport.context_count(), baseline);
    }

    #[tokio::test]
    async fn test_subscribe_faults_reach_the_caller() {
        let net = Network::new();
        let source = net.source_address();

        let zero_lease = net
            .sink
            .subscribe_actions(&source, [TEMPERATURE], Some(Expires::seconds(0)), Arc::new(Recorder::default()))
            .await;
        assert!(matches!(
            zero_lease,
            Err(SinkError::Fault(EventingFault::InvalidExpirationTime(_)))
        ));

        let xpath = Filter {
            dialect: Some("http://www.w3.org/TR/1999/REC-xpath-19991116".into()),
            content: "//Temperature".into(),
        };
        let wrong_dialect = net
            .sink
            .subscribe(&source, xpath, None, Arc::new(Recorder::default()))
            .await;
        assert!(matches!(
            wrong_dialect,
            Err(SinkError::Fault(EventingFault::FilteringRequestedUnavailable(_)))
        ));

        assert_eq!(net.source.subscription_count(), 0);
    }
}
