//! Trace-context propagation across the messaging boundary.
//!
//! A producer embeds its span context in message metadata; this module
//! converts between that wire representation (one JSON object under the
//! [`SPAN_CONTEXT_HEADER`] key) and the in-memory
//! [`TraceContextDescriptor`] that seeds the consumer span.
//!
//! ```rust
//! use spanlink::propagation::{self, TraceContextDescriptor};
//!
//! let descriptor = TraceContextDescriptor::new(
//!     "4bf92f3577b34da6a3ce929d0e0e4736",
//!     "00f067aa0ba902b7",
//!     "01",
//! );
//! let wire = propagation::encode(&descriptor);
//! assert_eq!(propagation::decode(&wire).unwrap(), descriptor);
//! ```

mod codec;
mod descriptor;

pub use codec::{decode, encode, SPAN_CONTEXT_HEADER};
pub use descriptor::TraceContextDescriptor;
