//! Error types for the consumer.
//!
//! ## Key Invariant
//!
//! Errors split into two classes. Recoverable kinds (decode failures,
//! flush timeouts) are contained within a single message's handling and
//! surfaced only as log output; they never abort the subscription. Fatal
//! kinds (connect failure, reconnect ceiling, broker close) propagate to
//! process termination, since a single-subject subscriber has no
//! meaningful partial-service mode.
//!
//! ```rust
//! use spanlink::ErrorKind;
//!
//! assert!(ErrorKind::MalformedContext.is_recoverable());
//! assert!(ErrorKind::BrokerClosed.is_fatal());
//! ```

mod core;
mod kind;

pub use core::Error;
pub use kind::ErrorKind;

/// A specialized `Result` type for consumer operations.
pub type Result<T> = std::result::Result<T, Error>;
