//! Main error type for the consumer.

use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt;

use super::ErrorKind;

/// The primary error type for consumer operations.
///
/// `Error` carries enough context to diagnose a failure without needing to
/// reproduce it:
/// - [`kind()`](Error::kind): categorization for `match` statements
/// - [`subject()`](Error::subject): the broker subject involved, if any
/// - [`retries()`](Error::retries): reconnect attempts at the time of failure
///
/// ## Example
///
/// ```rust
/// use spanlink::{Error, ErrorKind};
///
/// fn handle_error(err: Error) {
///     match err.kind() {
///         ErrorKind::FlushTimeout => {
///             eprintln!("span data may be lost: {}", err);
///         }
///         kind if kind.is_fatal() => {
///             std::process::exit(kind.exit_code());
///         }
///         _ => {
///             eprintln!("recoverable: {}", err);
///         }
///     }
/// }
/// ```
#[derive(Debug)]
pub struct Error {
    /// The error category.
    kind: ErrorKind,

    /// Human-readable error message.
    message: Cow<'static, str>,

    /// Broker subject involved, if any.
    subject: Option<String>,

    /// Reconnect attempts made at the time of failure.
    retries: Option<u32>,

    /// The underlying error, if any.
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
}

impl Error {
    /// Creates a new error with the given kind and message.
    ///
    /// # Example
    ///
    /// ```rust
    /// use spanlink::{Error, ErrorKind};
    ///
    /// let err = Error::new(ErrorKind::Configuration, "subject cannot be empty");
    /// assert_eq!(err.kind(), ErrorKind::Configuration);
    /// ```
    pub fn new(kind: ErrorKind, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind,
            message: message.into(),
            subject: None,
            retries: None,
            source: None,
        }
    }

    /// Creates an error from a kind with a default message.
    pub fn from_kind(kind: ErrorKind) -> Self {
        let message = match kind {
            ErrorKind::MalformedContext => "span context is not well-formed",
            ErrorKind::MissingField => "span context is missing a required field",
            ErrorKind::FlushTimeout => "flush did not complete in time",
            ErrorKind::ExportFailure => "exporter rejected the span batch",
            ErrorKind::ConnectFailure => "could not connect to the broker",
            ErrorKind::ReconnectCeilingExceeded => "gave up reconnecting to the broker",
            ErrorKind::BrokerClosed => "broker closed the connection",
            ErrorKind::Configuration => "invalid configuration",
            ErrorKind::Shutdown => "telemetry shutdown failed",
            ErrorKind::Internal => "internal error",
        };
        Self::new(kind, message)
    }

    /// Returns the error kind for categorization.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the broker subject involved, if recorded.
    #[inline]
    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    /// Returns the reconnect attempt count at the time of failure, if
    /// recorded.
    #[inline]
    pub fn retries(&self) -> Option<u32> {
        self.retries
    }

    /// Returns `true` if this error terminates the process.
    ///
    /// Equivalent to `self.kind().is_fatal()`.
    #[inline]
    pub fn is_fatal(&self) -> bool {
        self.kind.is_fatal()
    }

    /// Returns the process exit code for this error.
    #[inline]
    pub fn exit_code(&self) -> i32 {
        self.kind.exit_code()
    }

    /// Records the broker subject on this error.
    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Records the reconnect attempt count on this error.
    #[must_use]
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = Some(retries);
        self
    }

    /// Sets the source error for this error.
    #[must_use]
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    // Convenience constructors for common error types

    /// Creates a malformed-context error.
    pub fn malformed_context(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::MalformedContext, message)
    }

    /// Creates a missing-field error naming the absent field.
    pub fn missing_field(field: &'static str) -> Self {
        Self::new(
            ErrorKind::MissingField,
            format!("span context field `{}` is absent", field),
        )
    }

    /// Creates a flush-timeout error.
    pub fn flush_timeout(timeout: std::time::Duration) -> Self {
        Self::new(
            ErrorKind::FlushTimeout,
            format!("flush did not complete within {:?}", timeout),
        )
    }

    /// Creates an export-failure error.
    pub fn export_failure(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::ExportFailure, message)
    }

    /// Creates a connect-failure error.
    pub fn connect_failure(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::ConnectFailure, message)
    }

    /// Creates a broker-closed error.
    pub fn broker_closed(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::BrokerClosed, message)
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)?;

        if let Some(ref subject) = self.subject {
            write!(f, " (subject: {})", subject)?;
        }
        if let Some(retries) = self.retries {
            write!(f, " (retries: {})", retries)?;
        }

        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self::from_kind(kind)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::malformed_context(err.to_string()).with_source(err)
    }
}
