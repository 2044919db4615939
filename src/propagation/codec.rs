//! Wire codec for the span-context metadata value.
//!
//! The producer embeds its span context as a single JSON object under one
//! well-known metadata key rather than spreading it over per-field
//! headers. That keeps the propagation payload compact and consistent; the
//! cost is that one parse failure invalidates the whole context, which is
//! acceptable because falling back to a fresh root trace is always safe.

use serde_json::Value;

use crate::error::{Error, Result};

use super::TraceContextDescriptor;

/// The well-known metadata key holding the encoded span context.
pub const SPAN_CONTEXT_HEADER: &str = "spanContext";

/// Decodes the wire form of a span context.
///
/// The input is the first value found under [`SPAN_CONTEXT_HEADER`]: a
/// JSON object with string fields `TraceID`, `SpanID`, `TraceFlags`,
/// `TraceState` and boolean `Remote`. `TraceState` is optional and
/// defaults to empty. No other schema variant is accepted.
///
/// Fails with [`MalformedContext`](crate::ErrorKind::MalformedContext) if
/// the value is not a JSON object (or a field has the wrong type), and
/// with [`MissingField`](crate::ErrorKind::MissingField) if a required
/// field is absent. Pure function; the returned descriptor is not yet
/// validated; see [`TraceContextDescriptor::validate`].
///
/// ## Example
///
/// ```rust
/// use spanlink::propagation;
///
/// let raw = r#"{"TraceID":"4bf92f3577b34da6a3ce929d0e0e4736",
///               "SpanID":"00f067aa0ba902b7",
///               "TraceFlags":"01","TraceState":"","Remote":false}"#;
/// let descriptor = propagation::decode(raw).unwrap();
/// assert_eq!(descriptor.span_id, "00f067aa0ba902b7");
/// ```
pub fn decode(raw: &str) -> Result<TraceContextDescriptor> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| Error::malformed_context(format!("span context is not JSON: {}", e)))?;
    let object = value
        .as_object()
        .ok_or_else(|| Error::malformed_context("span context is not a JSON object"))?;

    let trace_id = required_str(object, "TraceID")?;
    let span_id = required_str(object, "SpanID")?;
    let trace_flags = required_str(object, "TraceFlags")?;
    let remote = required_bool(object, "Remote")?;
    let trace_state = match object.get("TraceState") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(_) => {
            return Err(Error::malformed_context("TraceState is not a string"));
        }
    };

    Ok(TraceContextDescriptor {
        trace_id,
        span_id,
        trace_flags,
        trace_state,
        remote,
    })
}

/// Encodes a descriptor into its wire form.
///
/// Always succeeds for a well-formed descriptor; construction-time
/// validation is the caller's responsibility.
pub fn encode(descriptor: &TraceContextDescriptor) -> String {
    serde_json::json!({
        "TraceID": descriptor.trace_id,
        "SpanID": descriptor.span_id,
        "TraceFlags": descriptor.trace_flags,
        "TraceState": descriptor.trace_state,
        "Remote": descriptor.remote,
    })
    .to_string()
}

fn required_str(object: &serde_json::Map<String, Value>, field: &'static str) -> Result<String> {
    match object.get(field) {
        None => Err(Error::missing_field(field)),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(Error::malformed_context(format!(
            "{} is not a string",
            field
        ))),
    }
}

fn required_bool(object: &serde_json::Map<String, Value>, field: &'static str) -> Result<bool> {
    match object.get(field) {
        None => Err(Error::missing_field(field)),
        Some(Value::Bool(b)) => Ok(*b),
        Some(_) => Err(Error::malformed_context(format!(
            "{} is not a boolean",
            field
        ))),
    }
}
