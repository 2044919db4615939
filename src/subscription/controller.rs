//! Connection resilience supervision.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::{broadcast, watch};

use crate::broker::ConnectionEvent;
use crate::config::ReconnectConfig;
use crate::error::{Error, ErrorKind, Result};

use super::{ConnectionPhase, SubscriptionState};

/// Supervises the broker connection lifecycle for one subscription.
///
/// The controller consumes lifecycle events, tracks the
/// [`ConnectionPhase`] state machine, and enforces the reconnect budget:
/// a fixed delay between attempts with a cumulative ceiling. When the
/// budget runs out, or the broker closes terminally, [`supervise`]
/// returns the fatal error that ends the process.
///
/// [`supervise`]: ResilienceController::supervise
pub struct ResilienceController {
    state: Arc<RwLock<SubscriptionState>>,
    config: ReconnectConfig,
    subject: String,
    url: String,
}

impl ResilienceController {
    /// Creates a controller in the `Connecting` phase.
    pub fn new(config: ReconnectConfig, subject: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            state: Arc::new(RwLock::new(SubscriptionState::new())),
            config,
            subject: subject.into(),
            url: url.into(),
        }
    }

    /// Returns the current connection phase.
    pub fn phase(&self) -> ConnectionPhase {
        self.state.read().phase
    }

    /// Returns the reconnect attempts made in the current outage.
    pub fn retry_count(&self) -> u32 {
        self.state.read().retry_count
    }

    /// Runs the supervision loop until the connection terminates.
    ///
    /// Returns `Ok(())` on graceful shutdown. Returns
    /// [`BrokerClosed`](ErrorKind::BrokerClosed) if the broker closes the
    /// connection, and
    /// [`ReconnectCeilingExceeded`](ErrorKind::ReconnectCeilingExceeded)
    /// when cumulative backoff passes the ceiling without recovery. Both
    /// are fatal; the consumer is expected to exit.
    pub async fn supervise(
        &self,
        mut events: broadcast::Receiver<ConnectionEvent>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<()> {
        loop {
            let reconnecting = self.state.read().phase.is_reconnecting();

            tokio::select! {
                _ = shutdown.changed() => {
                    self.state.write().record_closed();
                    tracing::info!(subject = %self.subject, "shutting down supervision");
                    return Ok(());
                }

                event = events.recv() => match event {
                    Ok(ConnectionEvent::Connected) => {
                        let was_reconnecting = {
                            let mut state = self.state.write();
                            let was = state.phase.is_reconnecting();
                            state.record_connected();
                            was
                        };
                        if was_reconnecting {
                            tracing::info!(url = %self.url, "reconnected to broker");
                        } else {
                            tracing::info!(url = %self.url, "broker connection established");
                        }
                    }
                    Ok(ConnectionEvent::Disconnected) => {
                        self.state.write().record_disconnected();
                        tracing::warn!(
                            url = %self.url,
                            delay = ?self.config.delay,
                            "broker connection lost, reconnecting"
                        );
                    }
                    Ok(ConnectionEvent::Closed { reason }) => {
                        self.state.write().record_closed();
                        let message = reason
                            .unwrap_or_else(|| "broker closed the connection".to_string());
                        return Err(Error::broker_closed(message)
                            .with_subject(self.subject.clone()));
                    }
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        tracing::warn!(missed, "lagged behind connection events");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        // The broker handle is gone; nothing can recover.
                        self.state.write().record_closed();
                        return Err(Error::broker_closed("event channel closed")
                            .with_subject(self.subject.clone()));
                    }
                },

                _ = tokio::time::sleep(self.config.delay), if reconnecting => {
                    let (retries, exhausted) = {
                        let mut state = self.state.write();
                        state.record_retry(self.config.delay);
                        (
                            state.retry_count,
                            self.config.is_exhausted(state.backoff_elapsed),
                        )
                    };
                    if exhausted {
                        self.state.write().record_closed();
                        return Err(Error::new(
                            ErrorKind::ReconnectCeilingExceeded,
                            format!(
                                "no reconnection within {:?}",
                                self.config.ceiling
                            ),
                        )
                        .with_subject(self.subject.clone())
                        .with_retries(retries));
                    }
                    tracing::debug!(
                        retries,
                        url = %self.url,
                        "still waiting for broker to come back"
                    );
                }
            }
        }
    }
}
