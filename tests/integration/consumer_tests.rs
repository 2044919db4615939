//! End-to-end tests for message consumption and span propagation.

use std::time::Duration;

use opentelemetry::trace::{SpanId, SpanKind, Status};
use spanlink::propagation::SPAN_CONTEXT_HEADER;
use spanlink::testing::{CapturingExporter, MockBroker};
use spanlink::InboundMessage;

use crate::common::*;

#[tokio::test]
async fn test_valid_context_produces_child_span() {
    let (consumer, exporter) = consumer_with_exporter(fast_config("orders.created"));
    let broker = MockBroker::new();
    let handler = RecordingHandler::new();
    let (task, shutdown) = spawn_consumer(consumer, &broker, handler.clone()).await;

    broker.deliver(traced_message("orders.created", b"payload"));
    wait_until("span exported", || exporter.spans().len() == 1).await;

    let spans = exporter.spans();
    assert_eq!(spans[0].span_context.trace_id().to_string(), TRACE_ID);
    assert_eq!(spans[0].parent_span_id.to_string(), SPAN_ID);
    assert_eq!(spans[0].span_kind, SpanKind::Consumer);
    assert_eq!(spans[0].name, "consume message");
    assert_eq!(handler.count(), 1);

    shutdown.send(true).expect("consumer still running");
    task.await.expect("task").expect("graceful shutdown");
}

#[tokio::test]
async fn test_remote_false_on_the_wire_still_adopts_parent() {
    let (consumer, exporter) = consumer_with_exporter(fast_config("orders.created"));
    let broker = MockBroker::new();
    let handler = RecordingHandler::new();
    let (task, shutdown) = spawn_consumer(consumer, &broker, handler.clone()).await;

    // Producers serialize Remote as false for their own local span; the
    // reconstructed parent is remote from this side regardless.
    let raw = format!(
        r#"{{"TraceID":"{}","SpanID":"{}","TraceFlags":"01","TraceState":"","Remote":false}}"#,
        TRACE_ID, SPAN_ID
    );
    broker.deliver(
        InboundMessage::new("orders.created", b"payload".to_vec())
            .with_metadata(SPAN_CONTEXT_HEADER, raw),
    );
    wait_until("span exported", || exporter.spans().len() == 1).await;

    let spans = exporter.spans();
    assert_eq!(spans[0].span_context.trace_id().to_string(), TRACE_ID);
    assert_eq!(spans[0].parent_span_id.to_string(), SPAN_ID);

    shutdown.send(true).expect("consumer still running");
    task.await.expect("task").expect("graceful shutdown");
}

#[tokio::test]
async fn test_missing_context_produces_root_span() {
    let (consumer, exporter) = consumer_with_exporter(fast_config("orders.created"));
    let broker = MockBroker::new();
    let handler = RecordingHandler::new();
    let (task, shutdown) = spawn_consumer(consumer, &broker, handler.clone()).await;

    broker.deliver(InboundMessage::new("orders.created", b"payload".to_vec()));
    wait_until("span exported", || exporter.spans().len() == 1).await;

    let spans = exporter.spans();
    assert_eq!(spans[0].parent_span_id, SpanId::INVALID);
    assert_ne!(spans[0].span_context.trace_id().to_string(), TRACE_ID);
    assert_eq!(handler.count(), 1);

    shutdown.send(true).expect("consumer still running");
    task.await.expect("task").expect("graceful shutdown");
}

#[tokio::test]
async fn test_malformed_context_degrades_to_root_span() {
    let (consumer, exporter) = consumer_with_exporter(fast_config("orders.created"));
    let broker = MockBroker::new();
    let handler = RecordingHandler::new();
    let (task, shutdown) = spawn_consumer(consumer, &broker, handler.clone()).await;

    // Not JSON at all, then JSON with a missing required field.
    broker.deliver(
        InboundMessage::new("orders.created", b"one".to_vec())
            .with_metadata(SPAN_CONTEXT_HEADER, "{{{{"),
    );
    broker.deliver(
        InboundMessage::new("orders.created", b"two".to_vec())
            .with_metadata(SPAN_CONTEXT_HEADER, r#"{"TraceID":"abc"}"#),
    );
    wait_until("spans exported", || exporter.spans().len() == 2).await;

    for span in exporter.spans() {
        assert_eq!(span.parent_span_id, SpanId::INVALID);
    }
    assert_eq!(handler.count(), 2);

    shutdown.send(true).expect("consumer still running");
    task.await.expect("task").expect("graceful shutdown");
}

#[tokio::test]
async fn test_each_message_gets_exactly_one_span() {
    let (consumer, exporter) = consumer_with_exporter(fast_config("events.>"));
    let broker = MockBroker::new();
    let handler = RecordingHandler::new();
    let (task, shutdown) = spawn_consumer(consumer, &broker, handler.clone()).await;

    for subject in ["events.a", "events.b", "events.c"] {
        broker.deliver(traced_message(subject, b"x"));
    }
    wait_until("all spans exported", || exporter.spans().len() == 3).await;

    // Dispatch is concurrent: every message handled once, order not
    // guaranteed.
    let mut subjects = handler.subjects();
    subjects.sort();
    assert_eq!(subjects, ["events.a", "events.b", "events.c"]);
    assert_eq!(exporter.spans().len(), 3);

    shutdown.send(true).expect("consumer still running");
    task.await.expect("task").expect("graceful shutdown");
}

#[tokio::test]
async fn test_handler_failure_marks_span_but_keeps_consuming() {
    let (consumer, exporter) = consumer_with_exporter(fast_config("orders.created"));
    let broker = MockBroker::new();
    let handler = RecordingHandler::failing();
    let (task, shutdown) = spawn_consumer(consumer, &broker, handler.clone()).await;

    broker.deliver(traced_message("orders.created", b"one"));
    broker.deliver(traced_message("orders.created", b"two"));
    wait_until("spans exported", || exporter.spans().len() == 2).await;

    for span in exporter.spans() {
        assert!(matches!(span.status, Status::Error { .. }));
    }
    assert_eq!(handler.count(), 2);

    shutdown.send(true).expect("consumer still running");
    task.await.expect("task").expect("graceful shutdown");
}

#[tokio::test]
async fn test_slow_collector_times_out_but_processing_continues() {
    let exporter = CapturingExporter::new().with_delay(Duration::from_millis(50));
    let config = fast_config("orders.created").with_flush_timeout(Duration::from_millis(10));
    let consumer = consumer_with(config, exporter.clone());
    let broker = MockBroker::new();
    let handler = RecordingHandler::new();
    let (task, shutdown) = spawn_consumer(consumer, &broker, handler.clone()).await;

    for payload in [b"one".as_slice(), b"two", b"three"] {
        broker.deliver(traced_message("orders.created", payload));
    }

    // Every flush times out, yet every message is still handled and the
    // export completes in the background.
    wait_until("all messages handled", || handler.count() == 3).await;
    wait_until("spans eventually exported", || exporter.spans().len() == 3).await;

    shutdown.send(true).expect("consumer still running");
    task.await.expect("task").expect("graceful shutdown");
}

#[tokio::test]
async fn test_graceful_shutdown_without_traffic() {
    let (consumer, exporter) = consumer_with_exporter(fast_config("orders.created"));
    let broker = MockBroker::new();
    let (task, shutdown) = spawn_consumer(consumer, &broker, RecordingHandler::new()).await;

    shutdown.send(true).expect("consumer still running");
    task.await.expect("task").expect("graceful shutdown");

    assert!(exporter.spans().is_empty());
    assert!(broker.is_closed());
}
