//! In-memory span exporter for tests.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use opentelemetry_sdk::export::trace::{ExportResult, SpanData, SpanExporter};
use opentelemetry_sdk::trace::{Config, TracerProvider};
use parking_lot::Mutex;

use crate::telemetry::trace_config;

/// A span exporter that captures finished spans in memory.
///
/// Cloning shares the underlying buffer, so a test can hand one clone to
/// the provider and keep another for assertions.
///
/// ## Example
///
/// ```rust
/// use spanlink::testing::{simple_provider, CapturingExporter};
/// use spanlink::TracingContext;
/// use std::time::Duration;
///
/// # #[tokio::main(flavor = "current_thread")] async fn main() {
/// let exporter = CapturingExporter::new();
/// let ctx = TracingContext::new(
///     simple_provider(exporter.clone()),
///     Duration::from_secs(5),
/// );
///
/// let guard = ctx.begin_span(None, "orders.created");
/// ctx.end_and_flush(guard).await.unwrap();
/// assert_eq!(exporter.spans().len(), 1);
/// # }
/// ```
#[derive(Clone, Default)]
pub struct CapturingExporter {
    spans: Arc<Mutex<Vec<SpanData>>>,
    delay: Option<Duration>,
}

impl CapturingExporter {
    /// Creates an exporter with an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every export block for `delay` before completing.
    ///
    /// Simulates a slow or unreachable collector for flush-timeout tests.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Returns a snapshot of the spans exported so far.
    pub fn spans(&self) -> Vec<SpanData> {
        self.spans.lock().clone()
    }

    /// Clears the captured spans.
    pub fn clear(&self) {
        self.spans.lock().clear();
    }
}

impl fmt::Debug for CapturingExporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapturingExporter")
            .field("captured", &self.spans.lock().len())
            .field("delay", &self.delay)
            .finish()
    }
}

impl SpanExporter for CapturingExporter {
    fn export(&mut self, batch: Vec<SpanData>) -> BoxFuture<'static, ExportResult> {
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        self.spans.lock().extend(batch);
        Box::pin(std::future::ready(Ok(())))
    }
}

/// Builds a provider that exports through `exporter` synchronously on span
/// end, with the same sampling and resource shape as production.
pub fn simple_provider(exporter: CapturingExporter) -> TracerProvider {
    provider_with_config(exporter, trace_config("spanlink-test"))
}

/// Like [`simple_provider`] but with an explicit trace configuration.
pub fn provider_with_config(exporter: CapturingExporter, config: Config) -> TracerProvider {
    TracerProvider::builder()
        .with_config(config)
        .with_simple_exporter(exporter)
        .build()
}
