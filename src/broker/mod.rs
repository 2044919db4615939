//! Broker connectivity.
//!
//! This module provides:
//! - [`BrokerConnection`]: the trait the consumer runs against
//! - [`InboundMessage`] and [`ConnectionEvent`]: the delivered-message and
//!   lifecycle vocabulary
//! - [`NatsBroker`]: the production NATS implementation
//! - [`MockBroker`]: an in-memory implementation for tests

mod mock;
mod nats;
mod traits;

pub use mock::MockBroker;
pub use nats::NatsBroker;
pub use traits::{BrokerConnection, ConnectionEvent, InboundMessage};
