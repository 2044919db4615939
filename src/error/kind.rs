//! Error kind enumeration for categorizing consumer errors.

/// Categorization of consumer errors.
///
/// This enum provides a stable interface for matching on error types.
/// The central distinction is recoverable vs fatal:
///
/// | ErrorKind                 | Fatal | Action                              |
/// |---------------------------|-------|-------------------------------------|
/// | `MalformedContext`        | No    | Fall back to a root span            |
/// | `MissingField`            | No    | Fall back to a root span            |
/// | `FlushTimeout`            | No    | Log; span is already ended          |
/// | `ExportFailure`           | No    | Log; exporter owns any retry        |
/// | `ConnectFailure`          | Yes   | Exit; no subscription, no purpose   |
/// | `ReconnectCeilingExceeded`| Yes   | Exit; broker unreachable too long   |
/// | `BrokerClosed`            | Yes   | Exit; broker ended the connection   |
/// | `Configuration`           | Yes   | Fix the configuration               |
/// | `Shutdown`                | Yes   | Telemetry teardown failed           |
/// | `Internal`                | Yes   | Unexpected; likely a bug            |
///
/// Recoverable errors are contained within a single message's handling and
/// surfaced only as log output; fatal errors terminate the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The span-context metadata value is not well-formed structured data.
    ///
    /// **Recoverable.** The message is processed under a fresh root trace.
    #[error("malformed trace context")]
    MalformedContext,

    /// A required field is absent from the span-context metadata value.
    ///
    /// **Recoverable.** The message is processed under a fresh root trace.
    #[error("missing trace context field")]
    MissingField,

    /// The synchronous flush did not complete within its timeout.
    ///
    /// The span is still considered ended; its data may be lost.
    ///
    /// **Recoverable.** Logged as a warning; the dispatcher moves on.
    #[error("flush timed out")]
    FlushTimeout,

    /// The exporter reported a failure while flushing buffered spans.
    ///
    /// **Recoverable.** No retry here; batching/backoff belongs to the
    /// exporter.
    #[error("span export failed")]
    ExportFailure,

    /// The initial broker connect failed.
    ///
    /// **Fatal.** A consumer with no subscription has no purpose.
    #[error("broker connect failed")]
    ConnectFailure,

    /// Cumulative reconnect backoff exceeded the configured ceiling.
    ///
    /// **Fatal.** Prevents an orphaned process from retrying forever.
    #[error("reconnect ceiling exceeded")]
    ReconnectCeilingExceeded,

    /// The broker closed the connection and will not reconnect
    /// (e.g. authentication revoked).
    ///
    /// **Fatal.**
    #[error("broker closed the connection")]
    BrokerClosed,

    /// Invalid startup configuration (empty subject, bad URL, ...).
    ///
    /// **Fatal.** Fix the configuration.
    #[error("configuration error")]
    Configuration,

    /// Telemetry shutdown failed to flush or tear down the provider.
    ///
    /// Only reported at process exit.
    #[error("shutdown error")]
    Shutdown,

    /// Unexpected internal error.
    ///
    /// **Fatal.** May indicate a bug.
    #[error("internal error")]
    Internal,
}

impl ErrorKind {
    /// Returns `true` if this error kind terminates the process.
    ///
    /// # Example
    ///
    /// ```rust
    /// use spanlink::ErrorKind;
    ///
    /// assert!(ErrorKind::BrokerClosed.is_fatal());
    /// assert!(!ErrorKind::MalformedContext.is_fatal());
    /// ```
    #[inline]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ErrorKind::ConnectFailure
                | ErrorKind::ReconnectCeilingExceeded
                | ErrorKind::BrokerClosed
                | ErrorKind::Configuration
                | ErrorKind::Shutdown
                | ErrorKind::Internal
        )
    }

    /// Returns `true` if this error kind is contained within a single
    /// message's handling.
    #[inline]
    pub fn is_recoverable(&self) -> bool {
        !self.is_fatal()
    }

    /// Returns the process exit code for this error kind.
    ///
    /// Recoverable kinds never reach process exit; they map to the generic
    /// failure code for completeness.
    #[inline]
    pub fn exit_code(&self) -> i32 {
        match self {
            ErrorKind::Configuration => 2,
            ErrorKind::ConnectFailure => 10,
            ErrorKind::ReconnectCeilingExceeded => 11,
            ErrorKind::BrokerClosed => 12,
            _ => 1,
        }
    }
}
