//! The reconstructed trace-context descriptor.

use std::fmt;

use opentelemetry::trace::{SpanContext, SpanId, TraceFlags, TraceId, TraceState};

use crate::error::{Error, Result};

/// A trace context reconstructed from message metadata.
///
/// Carries the identifying triple (trace ID, span ID, flags) plus optional
/// vendor state that links the consumer span to its logical parent across
/// the messaging boundary. Identifiers are kept in their wire form
/// (fixed-width hex strings) and validated before use; a descriptor that
/// fails validation must not seed a span, and processing falls back to a
/// fresh root trace.
///
/// ## Example
///
/// ```rust
/// use spanlink::TraceContextDescriptor;
///
/// let descriptor = TraceContextDescriptor::new(
///     "4bf92f3577b34da6a3ce929d0e0e4736",
///     "00f067aa0ba902b7",
///     "01",
/// );
/// assert!(descriptor.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceContextDescriptor {
    /// 128-bit trace identifier, 32 hex characters.
    pub trace_id: String,
    /// 64-bit span identifier of the producer span, 16 hex characters.
    pub span_id: String,
    /// 8-bit sampling/flags byte, 2 hex characters.
    pub trace_flags: String,
    /// Opaque vendor-extension state, possibly empty.
    pub trace_state: String,
    /// Wire value of the producer's `Remote` field, round-tripped
    /// verbatim. The reconstructed parent is always treated as remote
    /// regardless of this value.
    pub remote: bool,
}

impl TraceContextDescriptor {
    /// Creates a descriptor with empty trace state and `remote = true`.
    pub fn new(
        trace_id: impl Into<String>,
        span_id: impl Into<String>,
        trace_flags: impl Into<String>,
    ) -> Self {
        Self {
            trace_id: trace_id.into(),
            span_id: span_id.into(),
            trace_flags: trace_flags.into(),
            trace_state: String::new(),
            remote: true,
        }
    }

    /// Sets the vendor-extension trace state.
    #[must_use]
    pub fn with_trace_state(mut self, trace_state: impl Into<String>) -> Self {
        self.trace_state = trace_state.into();
        self
    }

    /// Validates the identifier fields.
    ///
    /// `trace_id` must be 32 hex characters and not all zeros, `span_id`
    /// 16 hex characters and not all zeros, `trace_flags` 2 hex
    /// characters. The trace state is opaque and never validated.
    pub fn validate(&self) -> Result<()> {
        validate_hex(&self.trace_id, 32, "TraceID")?;
        validate_hex(&self.span_id, 16, "SpanID")?;
        if self.trace_flags.len() != 2
            || !self.trace_flags.bytes().all(|b| b.is_ascii_hexdigit())
        {
            return Err(Error::malformed_context(format!(
                "TraceFlags `{}` is not a 2-character hex byte",
                self.trace_flags
            )));
        }
        Ok(())
    }

    /// Returns `true` if the descriptor passes validation.
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Builds the remote parent [`SpanContext`] this descriptor describes.
    ///
    /// The result is always marked remote: the producer span lives in
    /// another process whatever the wire `Remote` field claimed.
    pub fn to_span_context(&self) -> Result<SpanContext> {
        self.validate()?;

        let trace_id = TraceId::from_hex(&self.trace_id)
            .map_err(|_| Error::malformed_context("TraceID is not valid hex"))?;
        let span_id = SpanId::from_hex(&self.span_id)
            .map_err(|_| Error::malformed_context("SpanID is not valid hex"))?;
        let flags = u8::from_str_radix(&self.trace_flags, 16)
            .map_err(|_| Error::malformed_context("TraceFlags is not valid hex"))?;
        let trace_state = if self.trace_state.is_empty() {
            TraceState::default()
        } else {
            self.trace_state
                .parse::<TraceState>()
                .map_err(|_| Error::malformed_context("TraceState is not well-formed"))?
        };

        Ok(SpanContext::new(
            trace_id,
            span_id,
            TraceFlags::new(flags),
            true,
            trace_state,
        ))
    }
}

impl fmt::Display for TraceContextDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.trace_id, self.span_id, self.trace_flags)
    }
}

/// Validates a fixed-width hex identifier, rejecting the all-zero value.
fn validate_hex(value: &str, width: usize, field: &str) -> Result<()> {
    if value.len() != width || !value.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(Error::malformed_context(format!(
            "{} `{}` is not a {}-character hex string",
            field, value, width
        )));
    }
    if value.bytes().all(|b| b == b'0') {
        return Err(Error::malformed_context(format!(
            "{} is all zeros",
            field
        )));
    }
    Ok(())
}
