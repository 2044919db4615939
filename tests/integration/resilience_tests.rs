//! Tests for connection loss, reconnection, and terminal failures.

use std::time::Duration;

use spanlink::testing::MockBroker;
use spanlink::{ConnectionEvent, ErrorKind};

use crate::common::*;

#[tokio::test]
async fn test_reconnect_within_ceiling_resumes_consumption() {
    let (consumer, exporter) = consumer_with_exporter(fast_config("orders.created"));
    let broker = MockBroker::new();
    let handler = RecordingHandler::new();
    let (task, shutdown) = spawn_consumer(consumer, &broker, handler.clone()).await;

    broker.emit(ConnectionEvent::Connected);
    broker.deliver(traced_message("orders.created", b"before"));
    wait_until("first span exported", || exporter.spans().len() == 1).await;

    // Outage shorter than the 50ms ceiling.
    broker.emit(ConnectionEvent::Disconnected);
    tokio::time::sleep(Duration::from_millis(20)).await;
    broker.emit(ConnectionEvent::Connected);

    broker.deliver(traced_message("orders.created", b"after"));
    wait_until("second span exported", || exporter.spans().len() == 2).await;
    assert_eq!(handler.count(), 2);

    shutdown.send(true).expect("consumer still running");
    task.await.expect("task").expect("graceful shutdown");
}

#[tokio::test]
async fn test_repeated_outages_each_get_a_fresh_budget() {
    let (consumer, _exporter) = consumer_with_exporter(fast_config("orders.created"));
    let broker = MockBroker::new();
    let (task, shutdown) = spawn_consumer(consumer, &broker, RecordingHandler::new()).await;

    // Two outages, each within the ceiling; recovery resets the budget so
    // neither is fatal.
    for _ in 0..2 {
        broker.emit(ConnectionEvent::Disconnected);
        tokio::time::sleep(Duration::from_millis(30)).await;
        broker.emit(ConnectionEvent::Connected);
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    assert!(!task.is_finished());
    shutdown.send(true).expect("consumer still running");
    task.await.expect("task").expect("graceful shutdown");
}

#[tokio::test]
async fn test_reconnect_ceiling_exceeded_is_fatal() {
    let (consumer, exporter) = consumer_with_exporter(fast_config("orders.created"));
    let broker = MockBroker::new();
    let handler = RecordingHandler::new();
    let (task, _shutdown) = spawn_consumer(consumer, &broker, handler.clone()).await;

    broker.deliver(traced_message("orders.created", b"before outage"));
    wait_until("span exported", || exporter.spans().len() == 1).await;

    // Never comes back; the 50ms ceiling runs out.
    broker.emit(ConnectionEvent::Disconnected);
    let err = task.await.expect("task").expect_err("fatal error");

    assert_eq!(err.kind(), ErrorKind::ReconnectCeilingExceeded);
    assert!(err.is_fatal());
    assert_eq!(err.exit_code(), 11);
    assert_eq!(err.subject(), Some("orders.created"));
    assert!(err.retries().is_some());

    // Spans from before the outage are preserved.
    assert_eq!(exporter.spans().len(), 1);
}

#[tokio::test]
async fn test_broker_close_is_fatal() {
    let (consumer, _exporter) = consumer_with_exporter(fast_config("orders.created"));
    let broker = MockBroker::new();
    let (task, _shutdown) = spawn_consumer(consumer, &broker, RecordingHandler::new()).await;

    broker.emit(ConnectionEvent::Closed {
        reason: Some("authentication revoked".to_string()),
    });
    let err = task.await.expect("task").expect_err("fatal error");

    assert_eq!(err.kind(), ErrorKind::BrokerClosed);
    assert_eq!(err.exit_code(), 12);
    assert!(err.to_string().contains("authentication revoked"));
}

#[tokio::test]
async fn test_subscribe_failure_is_fatal() {
    let (consumer, _exporter) = consumer_with_exporter(fast_config("orders.created"));
    let broker = MockBroker::new();
    broker.fail_next_subscribe();

    let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let err = consumer
        .run_with_broker(&broker, RecordingHandler::new(), shutdown_rx)
        .await
        .expect_err("fatal error");

    assert_eq!(err.kind(), ErrorKind::ConnectFailure);
    assert_eq!(err.exit_code(), 10);
}

#[tokio::test]
async fn test_ended_stream_shuts_down_cleanly() {
    let (consumer, _exporter) = consumer_with_exporter(fast_config("orders.created"));
    let broker = MockBroker::new();
    let (task, _shutdown) = spawn_consumer(consumer, &broker, RecordingHandler::new()).await;

    broker.end_subscription();
    task.await.expect("task").expect("clean exit");
}
