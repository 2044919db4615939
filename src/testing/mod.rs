//! Testing utilities for the consumer.
//!
//! This module provides tools for testing applications built on the
//! consumer without a broker or a collector:
//!
//! - [`MockBroker`]: an in-memory broker with message injection and
//!   scripted lifecycle events
//! - [`CapturingExporter`]: a span exporter that records finished spans
//!   in memory
//! - [`simple_provider`]: a tracer provider that exports synchronously
//!   through a [`CapturingExporter`]
//!
//! ## Quick Start
//!
//! ```rust
//! use spanlink::testing::{simple_provider, CapturingExporter};
//! use spanlink::TracingContext;
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")] async fn main() {
//! let exporter = CapturingExporter::new();
//! let ctx = TracingContext::new(
//!     simple_provider(exporter.clone()),
//!     Duration::from_secs(5),
//! );
//! let guard = ctx.begin_span(None, "orders.created");
//! ctx.end_and_flush(guard).await.unwrap();
//! assert_eq!(exporter.spans().len(), 1);
//! # }
//! ```

mod exporter;

pub use exporter::{provider_with_config, simple_provider, CapturingExporter};

pub use crate::broker::MockBroker;
