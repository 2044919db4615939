//! Configuration types for the consumer.
//!
//! This module provides:
//! - [`ConsumerConfig`]: top-level consumer settings
//! - [`ReconnectConfig`]: reconnect delay and backoff ceiling

mod consumer;
mod reconnect;

pub use consumer::{
    ConsumerConfig, DEFAULT_BROKER_URL, DEFAULT_FLUSH_TIMEOUT, DEFAULT_OTLP_ENDPOINT,
};
pub use reconnect::ReconnectConfig;
