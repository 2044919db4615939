//! Common test harness for the spanlink integration tests.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use spanlink::propagation;
use spanlink::testing::{simple_provider, CapturingExporter, MockBroker};
use spanlink::{
    Consumer, ConsumerConfig, Error, InboundMessage, MessageHandler, ReconnectConfig, Result,
    TraceContextDescriptor, TracingContext,
};
use tokio::sync::watch;

/// W3C example trace identity used across the suite.
pub const TRACE_ID: &str = "4bf92f3577b34da6a3ce929d0e0e4736";
pub const SPAN_ID: &str = "00f067aa0ba902b7";

/// Configuration with a reconnect budget small enough to exhaust in a
/// test run.
pub fn fast_config(subject: &str) -> ConsumerConfig {
    ConsumerConfig::new(subject).with_reconnect(
        ReconnectConfig::new()
            .with_delay(Duration::from_millis(10))
            .with_ceiling(Duration::from_millis(50)),
    )
}

/// Builds a consumer whose spans land in the returned exporter.
pub fn consumer_with_exporter(config: ConsumerConfig) -> (Consumer, CapturingExporter) {
    let exporter = CapturingExporter::new();
    let consumer = consumer_with(config, exporter.clone());
    (consumer, exporter)
}

/// Builds a consumer around a specific exporter (e.g. a slow one).
pub fn consumer_with(config: ConsumerConfig, exporter: CapturingExporter) -> Consumer {
    let ctx = TracingContext::new(simple_provider(exporter), config.flush_timeout);
    Consumer::with_tracing(config, Arc::new(ctx)).expect("valid test config")
}

/// Handler that records every message it sees.
pub struct RecordingHandler {
    seen: Mutex<Vec<InboundMessage>>,
    fail: bool,
}

impl RecordingHandler {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            seen: Mutex::new(Vec::new()),
            fail: false,
        })
    }

    /// A handler that rejects every message.
    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            seen: Mutex::new(Vec::new()),
            fail: true,
        })
    }

    pub fn count(&self) -> usize {
        self.seen.lock().len()
    }

    pub fn subjects(&self) -> Vec<String> {
        self.seen.lock().iter().map(|m| m.subject.clone()).collect()
    }
}

#[async_trait::async_trait]
impl MessageHandler for RecordingHandler {
    async fn handle(&self, message: &InboundMessage) -> Result<()> {
        self.seen.lock().push(message.clone());
        if self.fail {
            Err(Error::internal("handler rejected message"))
        } else {
            Ok(())
        }
    }
}

/// A message carrying the standard producer span context.
pub fn traced_message(subject: &str, payload: &[u8]) -> InboundMessage {
    let descriptor = TraceContextDescriptor::new(TRACE_ID, SPAN_ID, "01");
    InboundMessage::new(subject, payload.to_vec()).with_metadata(
        propagation::SPAN_CONTEXT_HEADER,
        propagation::encode(&descriptor),
    )
}

/// Runs the consumer against the broker on a background task.
///
/// Returns the task handle and the shutdown trigger. The broker is
/// guaranteed to be subscribed before this returns.
pub async fn spawn_consumer(
    consumer: Consumer,
    broker: &MockBroker,
    handler: Arc<dyn MessageHandler>,
) -> (
    tokio::task::JoinHandle<Result<()>>,
    watch::Sender<bool>,
) {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let broker_handle = broker.clone();
    let task = tokio::spawn(async move {
        consumer
            .run_with_broker(&broker_handle, handler, shutdown_rx)
            .await
    });

    let subscribed = || !broker.subscribed_subjects().is_empty();
    wait_until("broker subscribed", subscribed).await;
    (task, shutdown_tx)
}

/// Polls `condition` until it holds, panicking after two seconds.
pub async fn wait_until(what: &str, condition: impl Fn() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !condition() {
        if tokio::time::Instant::now() > deadline {
            panic!("timed out waiting for: {}", what);
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
