//! NATS implementation of the broker abstraction.

use futures::StreamExt;
use tokio::sync::{broadcast, mpsc};

use crate::config::ConsumerConfig;
use crate::error::{Error, Result};

use super::{BrokerConnection, ConnectionEvent, InboundMessage};

/// Connection name reported to the server.
const CLIENT_NAME: &str = "spanlink-consumer";

/// Buffer size for the delivered-message channel.
const MESSAGE_BUFFER: usize = 64;

/// Buffer size for the connection-event broadcast channel.
const EVENT_BUFFER: usize = 16;

/// A live NATS connection.
///
/// Reconnects are delegated to the client: it retries with the configured
/// fixed delay up to the attempt budget derived from the backoff ceiling,
/// then gives up and closes. Lifecycle transitions surface on the event
/// channel so [`ResilienceController`](crate::subscription::ResilienceController)
/// can track them.
pub struct NatsBroker {
    client: async_nats::Client,
    url: String,
    events: broadcast::Sender<ConnectionEvent>,
}

impl NatsBroker {
    /// Connects to the broker described by `config`.
    ///
    /// The initial connection is not retried: a broker that is down at
    /// startup is a deployment problem, and failing fast with a fatal
    /// [`ConnectFailure`](crate::ErrorKind::ConnectFailure) surfaces it.
    pub async fn connect(config: &ConsumerConfig) -> Result<Self> {
        let (events, _) = broadcast::channel(EVENT_BUFFER);

        let delay = config.reconnect.delay;
        let events_tx = events.clone();
        let mut options = async_nats::ConnectOptions::new()
            .name(CLIENT_NAME)
            .max_reconnects(Some(config.reconnect.max_attempts() as usize))
            .reconnect_delay_callback(move |_attempts| delay)
            .event_callback(move |event| {
                let events_tx = events_tx.clone();
                async move {
                    if let Some(event) = map_event(event) {
                        // Nobody listening yet is fine.
                        let _ = events_tx.send(event);
                    }
                }
            });

        if let Some(path) = &config.credentials_file {
            options = options.credentials_file(path).await.map_err(|e| {
                Error::configuration(format!(
                    "cannot load credentials file {}",
                    path.display()
                ))
                .with_source(e)
            })?;
        }

        let client = options.connect(config.url.clone()).await.map_err(|e| {
            Error::connect_failure(format!("cannot connect to {}", config.url)).with_source(e)
        })?;
        tracing::info!(url = %config.url, "connected to broker");

        Ok(Self {
            client,
            url: config.url.clone(),
            events,
        })
    }
}

/// Maps a client event onto the consumer's lifecycle vocabulary.
///
/// Events with no bearing on the connection state machine (slow consumer,
/// lame duck, server errors) are logged and dropped.
fn map_event(event: async_nats::Event) -> Option<ConnectionEvent> {
    match event {
        async_nats::Event::Connected => Some(ConnectionEvent::Connected),
        async_nats::Event::Disconnected => Some(ConnectionEvent::Disconnected),
        async_nats::Event::Closed => Some(ConnectionEvent::Closed { reason: None }),
        other => {
            tracing::debug!(event = %other, "ignoring broker event");
            None
        }
    }
}

fn convert_message(message: async_nats::Message) -> InboundMessage {
    let mut inbound = InboundMessage::new(message.subject.to_string(), message.payload);
    if let Some(headers) = message.headers {
        for (name, values) in headers.iter() {
            inbound.metadata.insert(
                name.to_string(),
                values.iter().map(|v| v.as_str().to_string()).collect(),
            );
        }
    }
    inbound
}

#[async_trait::async_trait]
impl BrokerConnection for NatsBroker {
    async fn subscribe(&self, subject: String) -> Result<mpsc::Receiver<InboundMessage>> {
        let mut subscriber = self
            .client
            .subscribe(subject.clone())
            .await
            .map_err(|e| {
                Error::connect_failure("subscription failed")
                    .with_subject(subject.clone())
                    .with_source(e)
            })?;
        tracing::info!(subject, "subscribed");

        let (tx, rx) = mpsc::channel(MESSAGE_BUFFER);
        tokio::spawn(async move {
            while let Some(message) = subscriber.next().await {
                if tx.send(convert_message(message)).await.is_err() {
                    // Consumer dropped the receiver; stop pumping.
                    break;
                }
            }
            tracing::debug!(subject, "subscription stream ended");
        });

        Ok(rx)
    }

    fn subscribe_events(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.events.subscribe()
    }

    fn url(&self) -> &str {
        &self.url
    }

    async fn close(&self) -> Result<()> {
        self.client
            .drain()
            .await
            .map_err(|e| Error::broker_closed("drain failed").with_source(e))
    }
}
