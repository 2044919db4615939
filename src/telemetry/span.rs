//! Span lifecycle management.
//!
//! [`TracingContext`] wraps the single long-lived tracer provider and
//! hands out [`SpanGuard`]s, one per message. The guard owns the span and
//! guarantees it is ended exactly once on every exit path: the normal path
//! goes through [`TracingContext::end_and_flush`], and dropping an
//! unconsumed guard ends the span without flushing.

use std::time::Duration;

use opentelemetry::trace::{
    Span as _, SpanContext, SpanKind, Status, TraceContextExt, Tracer as _, TracerProvider as _,
};
use opentelemetry::{Context, KeyValue};
use opentelemetry_sdk::trace::{Span, Tracer, TracerProvider};

use crate::error::{Error, Result};
use crate::propagation::TraceContextDescriptor;

/// Instrumentation-scope name for consumer spans.
const TRACER_NAME: &str = "consumer";

/// Span name given to every per-message consumer span.
const SPAN_NAME: &str = "consume message";

/// Owns the tracer provider and mints per-message spans.
///
/// Created once at startup and shared across all message handling; the
/// provider must never be rebuilt per message, or spans land in isolated
/// providers and batching is defeated.
#[derive(Debug)]
pub struct TracingContext {
    provider: TracerProvider,
    tracer: Tracer,
    flush_timeout: Duration,
}

impl TracingContext {
    /// Wraps an already-built provider.
    ///
    /// `flush_timeout` bounds both [`end_and_flush`](Self::end_and_flush)
    /// and [`shutdown`](Self::shutdown).
    pub fn new(provider: TracerProvider, flush_timeout: Duration) -> Self {
        let tracer = provider.tracer(TRACER_NAME);
        Self {
            provider,
            tracer,
            flush_timeout,
        }
    }

    /// Starts the consumer span for one message.
    ///
    /// With a valid descriptor the span is a child of the reconstructed
    /// remote parent: same trace ID, parent span ID, flags, and vendor
    /// state. With `None`, or a descriptor that fails validation, the span
    /// starts a fresh root trace; an invalid context is logged and
    /// degraded, never fatal.
    pub fn begin_span(&self, descriptor: Option<&TraceContextDescriptor>, subject: &str) -> SpanGuard {
        let parent = descriptor.and_then(|d| match d.to_span_context() {
            Ok(remote) => Some(Context::new().with_remote_span_context(remote)),
            Err(err) => {
                tracing::warn!(subject, %err, "invalid span context, starting new trace");
                None
            }
        });
        // An explicit empty context keeps root spans independent of any
        // ambient context left on the worker task.
        let cx = parent.unwrap_or_else(Context::new);

        let span = self
            .tracer
            .span_builder(SPAN_NAME)
            .with_kind(SpanKind::Consumer)
            .with_attributes([
                KeyValue::new("messaging.system", "nats"),
                KeyValue::new("messaging.operation", "process"),
                KeyValue::new("messaging.destination.name", subject.to_string()),
            ])
            .start_with_context(&self.tracer, &cx);

        SpanGuard { span: Some(span) }
    }

    /// Ends the span and synchronously flushes the provider.
    ///
    /// Blocks message processing until the exporter confirms delivery or
    /// the flush timeout elapses. On timeout the span is already ended and
    /// the export continues in the background; the returned
    /// [`FlushTimeout`](crate::ErrorKind::FlushTimeout) error is
    /// recoverable and the next message proceeds normally.
    pub async fn end_and_flush(&self, guard: SpanGuard) -> Result<()> {
        let Some(mut span) = guard.take() else {
            return Ok(());
        };

        let provider = self.provider.clone();
        let flush = tokio::task::spawn_blocking(move || {
            span.end();
            let failures: Vec<String> = provider
                .force_flush()
                .into_iter()
                .filter_map(|r| r.err().map(|e| e.to_string()))
                .collect();
            if failures.is_empty() {
                Ok(())
            } else {
                Err(Error::export_failure(failures.join("; ")))
            }
        });

        match tokio::time::timeout(self.flush_timeout, flush).await {
            Ok(Ok(result)) => result,
            Ok(Err(join)) => Err(Error::internal("flush task failed").with_source(join)),
            Err(_) => Err(Error::flush_timeout(self.flush_timeout)),
        }
    }

    /// Flushes remaining spans and shuts the provider down.
    ///
    /// Called once at the end of the process. Failures surface as
    /// [`Shutdown`](crate::ErrorKind::Shutdown) errors.
    pub async fn shutdown(&self) -> Result<()> {
        let provider = self.provider.clone();
        let task = tokio::task::spawn_blocking(move || provider.shutdown());

        match tokio::time::timeout(self.flush_timeout, task).await {
            Ok(Ok(Ok(()))) => Ok(()),
            Ok(Ok(Err(e))) => Err(Error::new(
                crate::ErrorKind::Shutdown,
                "provider shutdown failed",
            )
            .with_source(e)),
            Ok(Err(join)) => Err(Error::internal("shutdown task failed").with_source(join)),
            Err(_) => Err(Error::new(
                crate::ErrorKind::Shutdown,
                "provider shutdown timed out",
            )),
        }
    }
}

/// A started consumer span, ended exactly once.
///
/// Pass the guard back to [`TracingContext::end_and_flush`] to end the
/// span and flush it. If the guard is dropped instead (handler panic, task
/// cancellation), `Drop` ends the span so it is never leaked open; it will
/// be exported on the next flush.
#[derive(Debug)]
pub struct SpanGuard {
    span: Option<Span>,
}

impl SpanGuard {
    /// Returns the span context of the in-flight span.
    pub fn span_context(&self) -> Option<&SpanContext> {
        self.span.as_ref().map(|s| s.span_context())
    }

    /// Records a processing failure on the span.
    ///
    /// The span status becomes an error carrying the message; the span
    /// still ends and flushes normally afterwards.
    pub fn record_failure(&mut self, err: &Error) {
        if let Some(span) = self.span.as_mut() {
            span.set_status(Status::error(err.to_string()));
        }
    }

    /// Sets an extra attribute on the span.
    pub fn set_attribute(&mut self, attribute: KeyValue) {
        if let Some(span) = self.span.as_mut() {
            span.set_attribute(attribute);
        }
    }

    fn take(mut self) -> Option<Span> {
        self.span.take()
    }
}

impl Drop for SpanGuard {
    fn drop(&mut self) {
        if let Some(mut span) = self.span.take() {
            span.end();
        }
    }
}
