//! # spanlink
//!
//! A NATS consumer that participates in distributed traces.
//!
//! Producers attach their span context to each message as a JSON object
//! under the `spanContext` header. This consumer reconstructs that
//! context, processes every message inside a consumer span that is a
//! child of the producer's span, and flushes the span synchronously
//! before moving on, so a trace backend shows the full produce/consume
//! path even if the process dies right after.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use spanlink::prelude::*;
//! use std::sync::Arc;
//! use tokio::sync::watch;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), spanlink::Error> {
//!     let config = ConsumerConfig::new("orders.created")
//!         .with_url("nats://127.0.0.1:4222")
//!         .with_otlp_endpoint("http://localhost:4317");
//!     let consumer = Consumer::new(config)?;
//!
//!     let (_shutdown_tx, shutdown_rx) = watch::channel(false);
//!     let handler = Arc::new(|message: InboundMessage| async move {
//!         println!("{}: {} bytes", message.subject, message.payload.len());
//!         Ok::<(), spanlink::Error>(())
//!     });
//!     consumer.run(handler, shutdown_rx).await
//! }
//! ```
//!
//! ## Key Concepts
//!
//! - **One provider**: a single tracer provider lives for the whole
//!   process; spans from every message batch through it
//! - **Degrade, don't drop**: a missing or malformed span context starts
//!   a fresh root trace, it never fails the message
//! - **Synchronous flush**: each span is flushed before the next message
//!   is processed, bounded by a per-message timeout
//! - **Bounded reconnects**: connection loss is retried on a fixed delay
//!   until a cumulative ceiling, then the process exits non-zero

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

// Core modules
pub mod broker;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod propagation;
pub mod subscription;
pub mod telemetry;

mod consumer;

// Testing utilities
pub mod testing;

// Prelude for convenient imports
pub mod prelude;

// Re-export main types at crate root for convenience
pub use broker::{BrokerConnection, ConnectionEvent, InboundMessage, NatsBroker};
pub use config::{ConsumerConfig, ReconnectConfig};
pub use consumer::Consumer;
pub use dispatch::{MessageDispatcher, MessageHandler};
pub use error::{Error, ErrorKind, Result};
pub use propagation::TraceContextDescriptor;
pub use subscription::{ConnectionPhase, ResilienceController};
pub use telemetry::{SpanGuard, TracingContext};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crate_compiles() {
        // Basic smoke test
        let _ = ErrorKind::BrokerClosed;
    }
}
