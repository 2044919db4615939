//! The consumer: wires broker, dispatch, and telemetry together.

use std::sync::Arc;

use tokio::sync::watch;

use crate::broker::{BrokerConnection, NatsBroker};
use crate::config::ConsumerConfig;
use crate::dispatch::{MessageDispatcher, MessageHandler};
use crate::error::Result;
use crate::subscription::ResilienceController;
use crate::telemetry::{init_tracer_provider, TracingContext};

/// A traced message consumer.
///
/// Owns the configuration and the single long-lived [`TracingContext`];
/// [`run`](Consumer::run) connects, subscribes, and processes messages
/// until shutdown or a fatal connection error.
///
/// ## Example
///
/// ```rust,no_run
/// use spanlink::{Consumer, ConsumerConfig, InboundMessage};
/// use std::sync::Arc;
/// use tokio::sync::watch;
///
/// # async fn example() -> spanlink::Result<()> {
/// let config = ConsumerConfig::new("orders.created");
/// let consumer = Consumer::new(config)?;
///
/// let (_shutdown_tx, shutdown_rx) = watch::channel(false);
/// let handler = Arc::new(|message: InboundMessage| async move {
///     println!("got {} bytes", message.payload.len());
///     Ok::<(), spanlink::Error>(())
/// });
/// consumer.run(handler, shutdown_rx).await
/// # }
/// ```
pub struct Consumer {
    config: ConsumerConfig,
    tracing: Arc<TracingContext>,
}

impl Consumer {
    /// Creates a consumer, building the OTLP tracer provider from the
    /// configuration.
    ///
    /// Must be called inside a tokio runtime; the provider's batch
    /// exporter runs on it.
    pub fn new(config: ConsumerConfig) -> Result<Self> {
        config.validate()?;
        let provider = init_tracer_provider(&config.otlp_endpoint, &config.service_name)?;
        let tracing = Arc::new(TracingContext::new(provider, config.flush_timeout));
        Ok(Self { config, tracing })
    }

    /// Creates a consumer around an existing tracing context.
    ///
    /// Lets tests swap in an in-memory exporter.
    pub fn with_tracing(config: ConsumerConfig, tracing: Arc<TracingContext>) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, tracing })
    }

    /// Returns the tracing context shared with dispatched messages.
    pub fn tracing(&self) -> &Arc<TracingContext> {
        &self.tracing
    }

    /// Connects to the configured broker and consumes until shutdown.
    ///
    /// A broker that is unreachable at startup fails fast with a fatal
    /// [`ConnectFailure`](crate::ErrorKind::ConnectFailure); reconnection
    /// only applies to connections that were once established.
    pub async fn run(
        &self,
        handler: Arc<dyn MessageHandler>,
        shutdown: watch::Receiver<bool>,
    ) -> Result<()> {
        let broker = NatsBroker::connect(&self.config).await?;
        self.run_with_broker(&broker, handler, shutdown).await
    }

    /// Consumes from an already-connected broker until shutdown.
    ///
    /// Returns `Ok(())` on graceful shutdown and the fatal error
    /// otherwise. Telemetry is flushed and shut down on every exit path;
    /// spans from already-processed messages are not lost to a fatal
    /// connection error.
    pub async fn run_with_broker(
        &self,
        broker: &dyn BrokerConnection,
        handler: Arc<dyn MessageHandler>,
        shutdown: watch::Receiver<bool>,
    ) -> Result<()> {
        let events = broker.subscribe_events();
        let messages = broker.subscribe(self.config.subject.clone()).await?;

        let controller = ResilienceController::new(
            self.config.reconnect.clone(),
            &self.config.subject,
            broker.url(),
        );
        let dispatcher = Arc::new(MessageDispatcher::new(Arc::clone(&self.tracing), handler));

        let result = tokio::select! {
            supervision = controller.supervise(events, shutdown) => supervision,
            () = Arc::clone(&dispatcher).run(messages) => {
                tracing::info!(subject = %self.config.subject, "message stream ended");
                Ok(())
            }
        };

        tracing::info!(
            processed = dispatcher.processed(),
            subject = %self.config.subject,
            "consumer stopped"
        );

        if let Err(err) = self.tracing.shutdown().await {
            tracing::warn!(%err, "telemetry shutdown failed");
        }
        if let Err(err) = broker.close().await {
            // Expected when the connection already died.
            tracing::debug!(%err, "broker close failed");
        }

        result
    }
}
