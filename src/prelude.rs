//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types for easy importing:
//!
//! ```rust
//! use spanlink::prelude::*;
//! ```
//!
//! This provides access to:
//! - The consumer and its configuration
//! - Broker and dispatch types
//! - Error types
//! - Trace propagation types

pub use crate::{
    broker::{BrokerConnection, ConnectionEvent, InboundMessage, NatsBroker},
    config::{ConsumerConfig, ReconnectConfig},
    consumer::Consumer,
    dispatch::{MessageDispatcher, MessageHandler},
    error::{Error, ErrorKind, Result},
    propagation::TraceContextDescriptor,
    subscription::{ConnectionPhase, ResilienceController},
    telemetry::{SpanGuard, TracingContext},
    testing::{CapturingExporter, MockBroker},
};
