//! In-memory broker for testing without a server.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc};

use crate::error::{Error, Result};

use super::{BrokerConnection, ConnectionEvent, InboundMessage};

/// An in-memory broker implementation.
///
/// Tests inject messages with [`deliver`](MockBroker::deliver) and drive
/// the connection lifecycle with [`emit`](MockBroker::emit); the consumer
/// under test sees them exactly as it would from a live connection.
/// Cloning shares the underlying state.
///
/// ## Example
///
/// ```rust
/// use spanlink::broker::{BrokerConnection, InboundMessage};
/// use spanlink::testing::MockBroker;
///
/// # #[tokio::main(flavor = "current_thread")] async fn main() {
/// let broker = MockBroker::new();
/// let mut messages = broker.subscribe("orders.created".to_string()).await.unwrap();
///
/// broker.deliver(InboundMessage::new("orders.created", b"payload".to_vec()));
/// let message = messages.recv().await.unwrap();
/// assert_eq!(message.subject, "orders.created");
/// # }
/// ```
#[derive(Clone)]
pub struct MockBroker {
    inner: Arc<MockBrokerInner>,
}

struct MockBrokerInner {
    url: String,
    events: broadcast::Sender<ConnectionEvent>,
    messages: Mutex<Option<mpsc::Sender<InboundMessage>>>,
    subscribed_subjects: Mutex<Vec<String>>,
    closed: Mutex<bool>,
    fail_subscribe: Mutex<bool>,
}

impl MockBroker {
    /// Creates a mock broker.
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            inner: Arc::new(MockBrokerInner {
                url: "nats://mock:4222".to_string(),
                events,
                messages: Mutex::new(None),
                subscribed_subjects: Mutex::new(Vec::new()),
                closed: Mutex::new(false),
                fail_subscribe: Mutex::new(false),
            }),
        }
    }

    /// Makes the next `subscribe` call fail with a connect error.
    pub fn fail_next_subscribe(&self) {
        *self.inner.fail_subscribe.lock() = true;
    }

    /// Delivers a message to the subscriber, if there is one.
    ///
    /// Messages delivered before `subscribe` are dropped, as on a real
    /// at-most-once subscription.
    pub fn deliver(&self, message: InboundMessage) {
        if let Some(tx) = self.inner.messages.lock().clone() {
            // Buffered send; tests never fill the channel.
            let _ = tx.try_send(message);
        }
    }

    /// Emits a connection-lifecycle event.
    pub fn emit(&self, event: ConnectionEvent) {
        let _ = self.inner.events.send(event);
    }

    /// Drops the message channel, ending the subscriber's stream.
    pub fn end_subscription(&self) {
        self.inner.messages.lock().take();
    }

    /// Returns the subjects subscribed so far.
    pub fn subscribed_subjects(&self) -> Vec<String> {
        self.inner.subscribed_subjects.lock().clone()
    }

    /// Returns `true` if `close` was called.
    pub fn is_closed(&self) -> bool {
        *self.inner.closed.lock()
    }
}

impl Default for MockBroker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl BrokerConnection for MockBroker {
    async fn subscribe(&self, subject: String) -> Result<mpsc::Receiver<InboundMessage>> {
        if std::mem::take(&mut *self.inner.fail_subscribe.lock()) {
            return Err(Error::connect_failure("mock subscribe failure").with_subject(subject));
        }
        self.inner.subscribed_subjects.lock().push(subject);
        let (tx, rx) = mpsc::channel(64);
        *self.inner.messages.lock() = Some(tx);
        Ok(rx)
    }

    fn subscribe_events(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.inner.events.subscribe()
    }

    fn url(&self) -> &str {
        &self.inner.url
    }

    async fn close(&self) -> Result<()> {
        *self.inner.closed.lock() = true;
        Ok(())
    }
}
