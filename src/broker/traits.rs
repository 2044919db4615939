//! Broker trait definitions and common types.
//!
//! This module defines the core broker abstraction the consumer runs
//! against: a subscribed message stream plus a connection-lifecycle event
//! stream. The production implementation is [`NatsBroker`](super::NatsBroker);
//! tests use [`MockBroker`](super::MockBroker).

use std::collections::HashMap;

use bytes::Bytes;
use tokio::sync::{broadcast, mpsc};

use crate::error::Result;
use crate::propagation::SPAN_CONTEXT_HEADER;

// ============================================================================
// Inbound Message
// ============================================================================

/// A message delivered by the broker.
///
/// Metadata is a multimap: a key can carry several values, and the first
/// one wins for trace-context purposes.
///
/// ## Example
///
/// ```rust
/// use spanlink::broker::InboundMessage;
///
/// let message = InboundMessage::new("orders.created", b"payload".to_vec())
///     .with_metadata("spanContext", r#"{"TraceID":"..."}"#);
/// assert!(message.trace_context_raw().is_some());
/// ```
#[derive(Debug, Clone)]
pub struct InboundMessage {
    /// Subject the message arrived on.
    pub subject: String,
    /// Raw payload bytes.
    pub payload: Bytes,
    /// Message metadata, one key to possibly many values.
    pub metadata: HashMap<String, Vec<String>>,
}

impl InboundMessage {
    /// Creates a message with empty metadata.
    pub fn new(subject: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            subject: subject.into(),
            payload: payload.into(),
            metadata: HashMap::new(),
        }
    }

    /// Appends a metadata value under `key`.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata
            .entry(key.into())
            .or_default()
            .push(value.into());
        self
    }

    /// Returns the first metadata value under `key`, if any.
    pub fn first_metadata(&self, key: &str) -> Option<&str> {
        self.metadata
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Returns the raw encoded span context, if the producer attached one.
    pub fn trace_context_raw(&self) -> Option<&str> {
        self.first_metadata(SPAN_CONTEXT_HEADER)
    }
}

// ============================================================================
// Connection Events
// ============================================================================

/// Connection-lifecycle events emitted by the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// The connection was (re)established.
    Connected,
    /// The connection was lost; the broker client is retrying.
    Disconnected,
    /// The connection is permanently closed and will not recover.
    Closed {
        /// Broker-reported reason, if any.
        reason: Option<String>,
    },
}

impl ConnectionEvent {
    /// Returns `true` if this event terminates the subscription.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ConnectionEvent::Closed { .. })
    }
}

impl std::fmt::Display for ConnectionEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionEvent::Connected => write!(f, "connected"),
            ConnectionEvent::Disconnected => write!(f, "disconnected"),
            ConnectionEvent::Closed { reason: Some(r) } => write!(f, "closed: {}", r),
            ConnectionEvent::Closed { reason: None } => write!(f, "closed"),
        }
    }
}

// ============================================================================
// Broker Trait
// ============================================================================

/// Core broker abstraction the consumer is written against.
///
/// Implementations own the wire connection. `subscribe` may be called
/// once per broker; the returned channel closes when the underlying
/// subscription ends.
#[async_trait::async_trait]
pub trait BrokerConnection: Send + Sync {
    /// Subscribes to a subject and streams its messages.
    async fn subscribe(&self, subject: String) -> Result<mpsc::Receiver<InboundMessage>>;

    /// Returns a receiver of connection-lifecycle events.
    ///
    /// Every call gets an independent receiver; events published before
    /// the call are not replayed.
    fn subscribe_events(&self) -> broadcast::Receiver<ConnectionEvent>;

    /// Returns the URL this broker is connected to.
    fn url(&self) -> &str;

    /// Closes the connection gracefully.
    async fn close(&self) -> Result<()>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_message_metadata_first_wins() {
        let message = InboundMessage::new("events", b"x".to_vec())
            .with_metadata("spanContext", "first")
            .with_metadata("spanContext", "second");
        assert_eq!(message.trace_context_raw(), Some("first"));
    }

    #[test]
    fn test_message_without_context() {
        let message = InboundMessage::new("events", b"x".to_vec());
        assert!(message.trace_context_raw().is_none());
        assert!(message.first_metadata("anything").is_none());
    }

    #[test]
    fn test_event_is_terminal() {
        assert!(!ConnectionEvent::Connected.is_terminal());
        assert!(!ConnectionEvent::Disconnected.is_terminal());
        assert!(ConnectionEvent::Closed { reason: None }.is_terminal());
    }

    #[test]
    fn test_event_display() {
        assert_eq!(ConnectionEvent::Connected.to_string(), "connected");
        assert_eq!(
            ConnectionEvent::Closed {
                reason: Some("authentication revoked".to_string())
            }
            .to_string(),
            "closed: authentication revoked"
        );
    }
}
