//! # Integration Test Flows
//!
//! Publisher and Subscriber talking through one in-memory engine. Every
//! published message is correlated to a service task of type `svc`, so
//! publishing it leases a job that the Subscriber turns back into a message.
//!
//! ## Flows Tested:
//!
//! 1. **Publish → job → deliver → ack**: payload and metadata survive, job completes
//! 2. **Nack**: job fails with one retry fewer
//! 3. **Request/reply**: correlation id carries over to a reply message
//! 4. **Shutdown**: close releases waiting jobs and ends the stream

#[cfg(test)]
mod tests {
    use std::sync::{Arc, OnceLock};
    use std::time::Duration;

    use bridge_telemetry::{init_telemetry, TelemetryConfig, TelemetryGuard};
    use futures::StreamExt;
    use shared_bus::{
        message_correlation_id, propagate_correlation_id, ContextError, Message, Subscription,
        CORRELATION_ID_METADATA_KEY,
    };
    use tokio::time::timeout;
    use zeebe_bridge::test_utils::InMemoryZeebe;
    use zeebe_bridge::{
        message_name, time_to_live, BridgeMetrics, BridgeSettings, DefaultMarshaller, Publisher,
        PublisherConfig, Subscriber, SubscriberConfig, MESSAGE_NAME_METADATA_KEY,
        TIME_TO_LIVE_METADATA_KEY,
    };

    const JOB_TYPE: &str = "svc";

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    static TELEMETRY: OnceLock<Option<TelemetryGuard>> = OnceLock::new();

    fn init_logging() {
        TELEMETRY.get_or_init(|| init_telemetry(TelemetryConfig::from_env()).ok());
    }

    struct Bridge {
        engine: Arc<InMemoryZeebe>,
        publisher: Publisher,
        subscriber: Subscriber,
        metrics: Arc<BridgeMetrics>,
    }

    fn bridge() -> Bridge {
        init_logging();

        let engine = Arc::new(InMemoryZeebe::new());
        engine.route_messages_to(JOB_TYPE);
        let metrics = Arc::new(BridgeMetrics::new());

        let publisher = Publisher::with_metrics(
            PublisherConfig::new()
                .with_client(engine.clone())
                .with_marshaller(Arc::new(DefaultMarshaller)),
            metrics.clone(),
        )
        .expect("valid publisher config");

        let settings = BridgeSettings::from_lookup(|key| match key {
            "ZEEBE_BRIDGE_WORKER" => Some("flows".to_string()),
            "ZEEBE_BRIDGE_POLL_INTERVAL_MS" => Some("5".to_string()),
            "ZEEBE_BRIDGE_CONCURRENCY" => Some("2".to_string()),
            _ => None,
        });
        let subscriber = Subscriber::with_metrics(
            SubscriberConfig::new()
                .with_client(engine.clone())
                .with_unmarshaller(Arc::new(DefaultMarshaller))
                .with_settings(settings),
            metrics.clone(),
        )
        .expect("valid subscriber config");

        Bridge {
            engine,
            publisher,
            subscriber,
            metrics,
        }
    }

    fn order_message(order: u32) -> Message {
        Message::with_new_uuid(format!(r#"{{"order":{order},"items":["a","b"]}}"#).into_bytes())
            .with_metadata(MESSAGE_NAME_METADATA_KEY, "order-placed")
            .with_metadata(TIME_TO_LIVE_METADATA_KEY, "60000")
            .with_metadata(CORRELATION_ID_METADATA_KEY, format!("order-{order}"))
            .with_metadata("tenant", "acme")
    }

    async fn next_message(sub: &mut Subscription) -> Message {
        timeout(Duration::from_secs(2), sub.recv())
            .await
            .expect("timeout waiting for delivery")
            .expect("subscription ended")
    }

    // =============================================================================
    // INTEGRATION TESTS: PUBLISH → SUBSCRIBE
    // =============================================================================

    #[tokio::test]
    async fn test_published_message_is_delivered_and_completed() {
        let bridge = bridge();
        let mut sub = bridge.subscriber.subscribe(JOB_TYPE).await.expect("subscribe");

        let sent = order_message(7);
        bridge
            .publisher
            .publish("orders", std::slice::from_ref(&sent))
            .await
            .expect("publish");

        let received = next_message(&mut sub).await;
        assert_eq!(received.payload, sent.payload);
        assert_ne!(received.uuid, sent.uuid);
        assert_eq!(received.metadata.get("tenant"), "acme");
        assert_eq!(message_name(&received), "order-placed");
        assert_eq!(time_to_live(&received), 60_000);
        assert_eq!(message_correlation_id(&received), "order-7");
        assert!(received.ack());

        assert!(
            bridge
                .engine
                .wait_for_resolved(1, Duration::from_secs(2))
                .await
        );
        assert_eq!(bridge.engine.completed().len(), 1);

        bridge.subscriber.close().await;
        let snapshot = bridge.metrics.snapshot();
        assert_eq!(snapshot.messages_published, 1);
        assert_eq!(snapshot.messages_delivered, 1);
        assert_eq!(snapshot.jobs_completed, 1);
    }

    #[tokio::test]
    async fn test_nacked_message_fails_job_with_one_retry_fewer() {
        let bridge = bridge();
        let mut sub = bridge.subscriber.subscribe(JOB_TYPE).await.expect("subscribe");

        bridge
            .publisher
            .publish("orders", &[order_message(1)])
            .await
            .expect("publish");

        assert!(next_message(&mut sub).await.nack());
        assert!(
            bridge
                .engine
                .wait_for_resolved(1, Duration::from_secs(2))
                .await
        );

        let failed = bridge.engine.failed();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].retries, 2);
        assert!(bridge.engine.completed().is_empty());

        bridge.subscriber.close().await;
    }

    #[tokio::test]
    async fn test_stream_of_messages_all_acked() {
        let bridge = bridge();
        let sub = bridge.subscriber.subscribe(JOB_TYPE).await.expect("subscribe");

        let messages: Vec<Message> = (0..5).map(order_message).collect();
        bridge
            .publisher
            .publish("orders", &messages)
            .await
            .expect("publish");

        let mut orders: Vec<u64> = timeout(
            Duration::from_secs(5),
            sub.take(5)
                .map(|msg| {
                    msg.ack();
                    let payload: serde_json::Value =
                        serde_json::from_slice(&msg.payload).expect("json payload");
                    payload["order"].as_u64().expect("order number")
                })
                .collect::<Vec<_>>(),
        )
        .await
        .expect("timeout");
        orders.sort_unstable();
        assert_eq!(orders, vec![0, 1, 2, 3, 4]);

        assert!(
            bridge
                .engine
                .wait_for_resolved(5, Duration::from_secs(2))
                .await
        );
        assert_eq!(bridge.engine.completed().len(), 5);

        bridge.subscriber.close().await;
        assert_eq!(bridge.metrics.snapshot().jobs_resolved(), 5);
    }

    #[tokio::test]
    async fn test_reply_keeps_correlation_id() {
        let bridge = bridge();
        let mut sub = bridge.subscriber.subscribe(JOB_TYPE).await.expect("subscribe");

        bridge
            .publisher
            .publish("orders", &[order_message(3)])
            .await
            .expect("publish");

        let mut request = next_message(&mut sub).await;
        let mut replies = [Message::with_new_uuid(br#"{"status":"shipped"}"#.to_vec())
            .with_metadata(MESSAGE_NAME_METADATA_KEY, "order-shipped")];
        propagate_correlation_id(&mut request, &mut replies);

        bridge
            .publisher
            .publish("shipments", &replies)
            .await
            .expect("publish reply");
        request.ack();

        let published = bridge.engine.published();
        assert_eq!(published.len(), 2);
        assert_eq!(published[1].name, "order-shipped");
        assert_eq!(published[1].correlation_key, "order-3");

        bridge.subscriber.close().await;
    }

    // =============================================================================
    // INTEGRATION TESTS: SHUTDOWN
    // =============================================================================

    #[tokio::test]
    async fn test_close_releases_unacked_job_and_ends_stream() {
        let bridge = bridge();
        let mut sub = bridge.subscriber.subscribe(JOB_TYPE).await.expect("subscribe");

        bridge
            .publisher
            .publish("orders", &[order_message(9)])
            .await
            .expect("publish");
        let held = next_message(&mut sub).await;

        bridge.subscriber.close().await;
        bridge.publisher.close();

        let failed = bridge.engine.failed();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].retries, 3);
        assert_eq!(held.context().err(), Some(ContextError::Cancelled));

        let ended = timeout(Duration::from_secs(2), sub.recv())
            .await
            .expect("timeout");
        assert!(ended.is_none());
        assert!(bridge
            .publisher
            .publish("orders", &[order_message(10)])
            .await
            .is_err());
    }
}
