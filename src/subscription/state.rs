//! Connection state machine types.

use std::time::Duration;

// ============================================================================
// Connection Phase
// ============================================================================

/// Phase of the broker connection, as the consumer tracks it.
///
/// Legal transitions:
///
/// ```text
/// Connecting -> Connected <-> Reconnecting
///                   |               |
///                   +----> Closed <-+
/// ```
///
/// `Closed` is terminal; it is reached on graceful shutdown, on a broker
/// close, or when the reconnect budget runs out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionPhase {
    /// Initial connection attempt in progress.
    #[default]
    Connecting,
    /// Connected and consuming.
    Connected,
    /// Connection lost; retrying with a fixed delay.
    Reconnecting,
    /// Terminal; no further messages will be consumed.
    Closed,
}

impl ConnectionPhase {
    /// Returns `true` if the connection is established.
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionPhase::Connected)
    }

    /// Returns `true` if the consumer is retrying the connection.
    pub fn is_reconnecting(&self) -> bool {
        matches!(self, ConnectionPhase::Reconnecting)
    }

    /// Returns `true` if the connection is terminally closed.
    pub fn is_closed(&self) -> bool {
        matches!(self, ConnectionPhase::Closed)
    }
}

impl std::fmt::Display for ConnectionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionPhase::Connecting => write!(f, "connecting"),
            ConnectionPhase::Connected => write!(f, "connected"),
            ConnectionPhase::Reconnecting => write!(f, "reconnecting"),
            ConnectionPhase::Closed => write!(f, "closed"),
        }
    }
}

// ============================================================================
// Subscription State
// ============================================================================

/// Mutable state tracked per subscription.
///
/// `retry_count` and `backoff_elapsed` only accumulate while
/// reconnecting and reset to zero the moment the connection comes back:
/// the reconnect budget bounds one outage, not the process lifetime.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionState {
    /// Current connection phase.
    pub phase: ConnectionPhase,
    /// Reconnect attempts in the current outage.
    pub retry_count: u32,
    /// Cumulative backoff spent in the current outage.
    pub backoff_elapsed: Duration,
}

impl SubscriptionState {
    /// Creates the initial state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a successful (re)connection, resetting the retry budget.
    pub fn record_connected(&mut self) {
        self.phase = ConnectionPhase::Connected;
        self.retry_count = 0;
        self.backoff_elapsed = Duration::ZERO;
    }

    /// Records a lost connection.
    pub fn record_disconnected(&mut self) {
        self.phase = ConnectionPhase::Reconnecting;
    }

    /// Records one reconnect attempt after waiting `delay`.
    pub fn record_retry(&mut self, delay: Duration) {
        self.retry_count += 1;
        self.backoff_elapsed += delay;
    }

    /// Records the terminal transition.
    pub fn record_closed(&mut self) {
        self.phase = ConnectionPhase::Closed;
    }
}
