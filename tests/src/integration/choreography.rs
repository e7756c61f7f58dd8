//! # Termination Choreography
//!
//! Every way a subscription can end, observed from both sides:
//!
//! | Trigger | Source side | Sink side |
//! |---------|-------------|-----------|
//! | `EventSource::shutdown` | all removed | `SourceShuttingDown` end, proxy dropped |
//! | `EventSource::cancel_all` | all removed | `SourceCanceling` end, proxy dropped |
//! | NotifyTo unreachable | evicted at next dispatch | `DeliveryFailure` end |
//! | Queue overflow | evicted at next dispatch, siblings unaffected | `DeliveryFailure` end |
//! | Lease elapsed | evicted by sweep | no message; source faults further requests |

#[cfg(test)]
mod tests {
    use super::super::support::*;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Semaphore;
    use wse_01_event_source::{EventSourceApi, EventSourceConfig};
    use wse_02_event_sink::{EventSinkConfig, SinkError};
    use wse_node::{NodeConfig, NodeRuntime};
    use wse_transport::{Transport, TransportError};
    use wse_types::constants::{
        STATUS_DELIVERY_FAILURE, STATUS_SOURCE_CANCELING, STATUS_SOURCE_SHUTTING_DOWN,
    };
    use wse_types::{EventingFault, Expires};

    // =========================================================================
    // SOURCE-INITIATED ENDS
    // =========================================================================

    #[tokio::test]
    async fn test_shutdown_notifies_every_sink() {
        let net = Network::new();
        let recorder = Arc::new(Recorder::default());
        let source = net.source_address();
        for action in [TEMPERATURE, HUMIDITY] {
            net.sink
                .subscribe_actions(&source, [action], None, recorder.clone())
                .await
                .unwrap();
        }

        net.source.shutdown(Duration::from_secs(1)).await;

        eventually("both ends", || recorder.ends().len() == 2).await;
        assert!(recorder
            .ends()
            .iter()
            .all(|(_, status, _)| status == STATUS_SOURCE_SHUTTING_DOWN));
        assert_eq!(net.sink.subscription_count(), 0);
        assert_eq!(net.source.subscription_count(), 0);
        assert_eq!(net.source.send_notification(TEMPERATURE, json!({})), 0);

        let late = net
            .sink
            .subscribe_actions(&source, [TEMPERATURE], None, recorder.clone())
            .await;
        assert!(matches!(
            late,
            Err(SinkError::Transport(TransportError::Unreachable(_)))
        ));
    }

    #[tokio::test]
    async fn test_shutdown_is_idempotent() {
        let net = Network::new();
        let recorder = Arc::new(Recorder::default());
        net.sink
            .subscribe_actions(&net.source_address(), [TEMPERATURE], None, recorder.clone())
            .await
            .unwrap();

        net.source.shutdown(Duration::from_secs(1)).await;
        net.source.shutdown(Duration::from_secs(1)).await;

        eventually("one end", || recorder.ends().len() == 1).await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(recorder.ends().len(), 1);
    }

    #[tokio::test]
    async fn test_cancel_all_reports_reason() {
        let net = Network::new();
        let recorder = Arc::new(Recorder::default());
        let (id, _) = net
            .sink
            .subscribe_actions(&net.source_address(), [TEMPERATURE], None, recorder.clone())
            .await
            .unwrap();

        assert_eq!(net.source.cancel_all(Some("maintenance")), 1);

        eventually("cancel end", || !recorder.ends().is_empty()).await;
        assert_eq!(
            recorder.ends(),
            vec![(id, STATUS_SOURCE_CANCELING.to_string(), Some("maintenance".to_string()))]
        );
        eventually("proxy dropped", || net.sink.subscription_count() == 0).await;

        // The source stays open for new subscriptions.
        net.sink
            .subscribe_actions(&net.source_address(), [TEMPERATURE], None, recorder.clone())
            .await
            .unwrap();
        assert_eq!(net.source.subscription_count(), 1);
    }

    // =========================================================================
    // DELIVERY LOSS
    // =========================================================================

    #[tokio::test]
    async fn test_unreachable_notify_to_ends_with_delivery_failure() {
        let net = Network::new();
        let recorder = Arc::new(Recorder::default());
        let (id, _) = net
            .sink
            .subscribe_actions(&net.source_address(), [TEMPERATURE], None, recorder.clone())
            .await
            .unwrap();

        let [notify_path, _] = net.sink.subscription(&id).unwrap().push_paths().map(str::to_string);
        assert!(net
            .transport
            .unregister_context(&net.sink.config().local_base, &notify_path));

        net.source.send_notification(TEMPERATURE, json!({ "celsius": 1 }));
        let manager = net.source.subscription(&id).unwrap();
        eventually("worker stopped", || !manager.is_running()).await;

        // The next dispatch sweeps the failed subscription out.
        assert_eq!(net.source.send_notification(TEMPERATURE, json!({ "celsius": 2 })), 0);
        assert!(net.source.subscription(&id).is_none());

        eventually("delivery failure end", || !recorder.ends().is_empty()).await;
        let (ended, status, _) = recorder.ends().remove(0);
        assert_eq!(ended, id);
        assert_eq!(status, STATUS_DELIVERY_FAILURE);
        assert_eq!(recorder.count(), 0);
        eventually("proxy dropped", || net.sink.subscription_count() == 0).await;
    }

    #[tokio::test]
    async fn test_slow_sink_overflows_without_affecting_sibling() {
        let source_config = EventSourceConfig {
            queue_capacity: 2,
            ..Default::default()
        };
        let net = Network::with_configs(source_config, EventSinkConfig::default());
        let gate = Arc::new(Semaphore::new(0));
        let slow = Arc::new(Recorder::gated(gate.clone()));
        let fast = Arc::new(Recorder::default());
        let source = net.source_address();
        let (slow_id, _) = net
            .sink
            .subscribe_actions(&source, [TEMPERATURE], None, slow.clone())
            .await
            .unwrap();
        let (fast_id, _) = net
            .sink
            .subscribe_actions(&source, [TEMPERATURE], None, fast.clone())
            .await
            .unwrap();

        let mut accepted = Vec::new();
        for reading in 0..10 {
            accepted.push(net.source.send_notification(TEMPERATURE, json!({ "celsius": reading })));
            eventually("fast sink keeps up", || fast.count() == reading + 1).await;
        }

        // One in flight plus two queued, then the slow subscription overflows.
        assert_eq!(&accepted[..3], &[2, 2, 2]);
        assert_eq!(accepted[3], 1);
        assert!(accepted[4..].iter().all(|&n| n == 1));
        assert!(net.source.subscription(&slow_id).is_none());
        assert!(net.source.subscription(&fast_id).is_some());
        assert!(fast.ends().is_empty());

        gate.add_permits(16);
        eventually("overflow end", || !slow.ends().is_empty()).await;
        assert_eq!(slow.ends()[0].0, slow_id);
        assert_eq!(slow.ends()[0].1, STATUS_DELIVERY_FAILURE);
        assert!(slow.count() <= 3);
    }

    // =========================================================================
    // EXPIRY
    // =========================================================================

    #[tokio::test]
    async fn test_elapsed_lease_is_swept_silently() {
        let net = Network::new();
        let recorder = Arc::new(Recorder::default());
        let (id, _) = net
            .sink
            .subscribe_actions(
                &net.source_address(),
                [TEMPERATURE],
                Some(Expires::seconds(1)),
                recorder.clone(),
            )
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(net.source.send_notification(TEMPERATURE, json!({})), 0);
        assert_eq!(net.source.subscription_count(), 0);

        assert!(matches!(
            net.sink.get_status(&id).await,
            Err(SinkError::Fault(EventingFault::InvalidMessage(_)))
        ));
        assert!(recorder.ends().is_empty());
        assert_eq!(recorder.count(), 0);
    }

    #[tokio::test]
    async fn test_auto_renew_outlives_short_lease() {
        let sink_config = EventSinkConfig {
            auto_renew_lead_ms: Some(400),
            ..Default::default()
        };
        let net = Network::with_configs(EventSourceConfig::default(), sink_config);
        let recorder = Arc::new(Recorder::default());
        let (id, _) = net
            .sink
            .subscribe_actions(
                &net.source_address(),
                [TEMPERATURE],
                Some(Expires::seconds(1)),
                recorder.clone(),
            )
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(net.source.send_notification(TEMPERATURE, json!({ "celsius": 3 })), 1);
        eventually("delivery after renewal", || recorder.count() == 1).await;
        assert!(net.sink.get_status(&id).await.is_ok());

        net.sink.unsubscribe(&id).await.unwrap();
    }

    // =========================================================================
    // NODE
    // =========================================================================

    #[tokio::test]
    async fn test_node_heartbeat_round_trip() {
        let mut config = NodeConfig::default();
        config.heartbeat.interval_ms = 10;
        let mut node = NodeRuntime::new(config).unwrap();
        node.start().await.unwrap();

        eventually("heartbeats", || node.callback().received() >= 2).await;
        node.shutdown().await;

        assert!(node.source().is_closed());
        assert_eq!(node.sink().subscription_count(), 0);
    }
}
