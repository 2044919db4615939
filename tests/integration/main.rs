//! Integration tests for the spanlink consumer.
//!
//! These tests run the full consumer pipeline in memory: a
//! [`MockBroker`](spanlink::testing::MockBroker) stands in for the NATS
//! server and a [`CapturingExporter`](spanlink::testing::CapturingExporter)
//! stands in for the OTLP collector, so every test asserts on the spans
//! that would actually reach a trace backend.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test --test integration
//! ```

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod common;
mod consumer_tests;
mod resilience_tests;
