//! OpenTelemetry tracer provider setup.

use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::resource::Resource;
use opentelemetry_sdk::trace::{BatchSpanProcessor, Config, Sampler, TracerProvider};

use crate::error::{Error, Result};

/// Builds the trace configuration shared by every provider: always-on
/// sampling plus the service resource.
///
/// Reconstructed remote contexts carry their own sampling flags, but
/// every consumer span is recorded regardless.
pub fn trace_config(service_name: &str) -> Config {
    Config::default()
        .with_sampler(Sampler::AlwaysOn)
        .with_resource(Resource::new(vec![
            KeyValue::new("service.name", service_name.to_string()),
            KeyValue::new("deployment.environment", "production"),
            KeyValue::new("service.instance.id", "1"),
        ]))
}

/// Creates the long-lived tracer provider exporting to an OTLP collector.
///
/// The provider batches spans in the background; per-message delivery
/// guarantees come from the synchronous flush in
/// [`TracingContext::end_and_flush`](super::TracingContext::end_and_flush),
/// not from the batching interval. Created once at startup and shared,
/// never per message.
pub fn init_tracer_provider(endpoint: &str, service_name: &str) -> Result<TracerProvider> {
    let exporter = opentelemetry_otlp::new_exporter()
        .tonic()
        .with_endpoint(endpoint.to_string())
        .build_span_exporter()
        .map_err(|e| {
            Error::configuration(format!("failed to build OTLP exporter for {}", endpoint))
                .with_source(e)
        })?;

    let processor =
        BatchSpanProcessor::builder(exporter, opentelemetry_sdk::runtime::Tokio).build();

    Ok(TracerProvider::builder()
        .with_config(trace_config(service_name))
        .with_span_processor(processor)
        .build())
}
