//! Subscription lifecycle and connection resilience.
//!
//! This module provides:
//! - [`ConnectionPhase`] and [`SubscriptionState`]: the connection state
//!   machine
//! - [`ResilienceController`]: supervises lifecycle events and enforces
//!   the reconnect budget

mod controller;
mod state;

pub use controller::ResilienceController;
pub use state::{ConnectionPhase, SubscriptionState};
