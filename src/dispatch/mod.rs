//! Per-message dispatch.
//!
//! This module provides:
//! - [`MessageHandler`]: the application callback invoked per message
//! - [`MessageDispatcher`]: drives decode, span lifecycle, handler
//!   invocation, and the synchronous flush for each delivered message

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::broker::InboundMessage;
use crate::error::{ErrorKind, Result};
use crate::propagation::{self, TraceContextDescriptor};
use crate::telemetry::TracingContext;

/// Application callback invoked once per delivered message.
///
/// Runs inside the message's consumer span. A returned error marks the
/// span as failed but never stops the consumer; broker-level failures are
/// handled elsewhere.
#[async_trait::async_trait]
pub trait MessageHandler: Send + Sync {
    /// Processes one message.
    async fn handle(&self, message: &InboundMessage) -> Result<()>;
}

/// Blanket implementation so plain async closures work as handlers.
#[async_trait::async_trait]
impl<F, Fut> MessageHandler for F
where
    F: Fn(InboundMessage) -> Fut + Send + Sync,
    Fut: std::future::Future<Output = Result<()>> + Send,
{
    async fn handle(&self, message: &InboundMessage) -> Result<()> {
        self(message.clone()).await
    }
}

/// Drives the per-message pipeline.
///
/// For every message: reconstruct the producer's trace context from
/// metadata, start the consumer span (child or fresh root), invoke the
/// handler, then end the span and flush synchronously. Deliveries are
/// dispatched concurrently, one task each; the flush bounds one message's
/// handling, not the whole stream, and no ordering holds across messages
/// since each carries its own trace context.
pub struct MessageDispatcher {
    tracing: Arc<TracingContext>,
    handler: Arc<dyn MessageHandler>,
    sequence: AtomicU64,
}

impl MessageDispatcher {
    /// Creates a dispatcher.
    pub fn new(tracing: Arc<TracingContext>, handler: Arc<dyn MessageHandler>) -> Self {
        Self {
            tracing,
            handler,
            sequence: AtomicU64::new(0),
        }
    }

    /// Returns how many messages have been dispatched.
    pub fn processed(&self) -> u64 {
        self.sequence.load(Ordering::Relaxed)
    }

    /// Extracts the trace context from message metadata.
    ///
    /// `None` when the producer attached no context, and also when the
    /// attached context cannot be decoded: a malformed context is logged
    /// and degraded to a fresh root trace, never propagated as a failure.
    fn extract_context(message: &InboundMessage) -> Option<TraceContextDescriptor> {
        let raw = message.trace_context_raw()?;
        match propagation::decode(raw) {
            Ok(descriptor) => Some(descriptor),
            Err(err) => {
                tracing::warn!(
                    subject = %message.subject,
                    %err,
                    "unusable span context, starting new trace"
                );
                None
            }
        }
    }

    /// Processes one message end to end.
    ///
    /// Infallible from the caller's point of view: every per-message
    /// failure mode (malformed context, handler error, flush timeout) is
    /// recoverable and absorbed here after logging.
    pub async fn dispatch(&self, message: InboundMessage) {
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        let descriptor = Self::extract_context(&message);
        let mut guard = self
            .tracing
            .begin_span(descriptor.as_ref(), &message.subject);

        if let Err(err) = self.handler.handle(&message).await {
            guard.record_failure(&err);
            tracing::warn!(seq, subject = %message.subject, %err, "handler failed");
        }

        if let Err(err) = self.tracing.end_and_flush(guard).await {
            if err.kind() == ErrorKind::FlushTimeout {
                tracing::warn!(seq, subject = %message.subject, %err, "span data may be lost");
            } else {
                tracing::warn!(seq, subject = %message.subject, %err, "flush failed");
            }
        }

        tracing::info!(
            seq,
            subject = %message.subject,
            bytes = message.payload.len(),
            "processed message"
        );
    }

    /// Consumes the message stream until it closes, one task per message.
    ///
    /// When the stream ends, in-flight messages are drained before
    /// returning. Cancelling this future aborts in-flight handlers; their
    /// span guards still end the spans, which are picked up by the final
    /// shutdown flush.
    pub async fn run(self: Arc<Self>, mut messages: mpsc::Receiver<InboundMessage>) {
        let mut inflight = tokio::task::JoinSet::new();
        loop {
            tokio::select! {
                message = messages.recv() => match message {
                    Some(message) => {
                        let dispatcher = Arc::clone(&self);
                        inflight.spawn(async move { dispatcher.dispatch(message).await });
                    }
                    None => break,
                },
                Some(finished) = inflight.join_next(), if !inflight.is_empty() => {
                    if let Err(err) = finished {
                        // Guard drop already ended the span during unwind.
                        tracing::warn!(%err, "message task panicked");
                    }
                }
            }
        }
        while let Some(finished) = inflight.join_next().await {
            if let Err(err) = finished {
                tracing::warn!(%err, "message task panicked");
            }
        }
        tracing::debug!("message stream ended");
    }
}
