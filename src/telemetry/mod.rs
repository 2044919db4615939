//! Span lifecycle on top of one long-lived tracer provider.
//!
//! This module provides:
//! - [`TracingContext`]: owns the provider, mints per-message spans,
//!   flushes synchronously
//! - [`SpanGuard`]: scoped handle ensuring each span ends exactly once
//! - [`init_tracer_provider`]: OTLP pipeline setup, called once at startup

mod provider;
mod span;

pub use provider::{init_tracer_provider, trace_config};
pub use span::{SpanGuard, TracingContext};
