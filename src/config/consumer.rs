//! Top-level consumer configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};

use super::ReconnectConfig;

/// Default broker URL.
pub const DEFAULT_BROKER_URL: &str = "nats://127.0.0.1:4222";

/// Default OTLP collector endpoint.
pub const DEFAULT_OTLP_ENDPOINT: &str = "http://localhost:4317";

/// Default bound on the synchronous per-message flush.
pub const DEFAULT_FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for a [`Consumer`](crate::Consumer).
///
/// ## Example
///
/// ```rust
/// use spanlink::ConsumerConfig;
/// use std::time::Duration;
///
/// let config = ConsumerConfig::new("orders.created")
///     .with_url("nats://broker.internal:4222")
///     .with_otlp_endpoint("http://collector:4317")
///     .with_flush_timeout(Duration::from_secs(2));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct ConsumerConfig {
    /// Broker URL(s), comma separated.
    pub url: String,

    /// Subject to subscribe to.
    pub subject: String,

    /// OTLP collector endpoint spans are exported to.
    pub otlp_endpoint: String,

    /// Service name reported in the trace resource.
    pub service_name: String,

    /// Bound on the synchronous per-message flush.
    pub flush_timeout: Duration,

    /// Optional broker credentials file.
    pub credentials_file: Option<PathBuf>,

    /// Reconnect behavior.
    pub reconnect: ReconnectConfig,
}

impl ConsumerConfig {
    /// Creates a configuration for the given subject with defaults for
    /// everything else.
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            url: DEFAULT_BROKER_URL.to_string(),
            subject: subject.into(),
            otlp_endpoint: DEFAULT_OTLP_ENDPOINT.to_string(),
            service_name: "spanlink".to_string(),
            flush_timeout: DEFAULT_FLUSH_TIMEOUT,
            credentials_file: None,
            reconnect: ReconnectConfig::default(),
        }
    }

    /// Sets the broker URL.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Sets the OTLP collector endpoint.
    #[must_use]
    pub fn with_otlp_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.otlp_endpoint = endpoint.into();
        self
    }

    /// Sets the service name reported in the trace resource.
    #[must_use]
    pub fn with_service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = name.into();
        self
    }

    /// Sets the bound on the synchronous per-message flush.
    #[must_use]
    pub fn with_flush_timeout(mut self, timeout: Duration) -> Self {
        self.flush_timeout = timeout;
        self
    }

    /// Sets the broker credentials file.
    #[must_use]
    pub fn with_credentials_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.credentials_file = Some(path.into());
        self
    }

    /// Sets the reconnect behavior.
    #[must_use]
    pub fn with_reconnect(mut self, reconnect: ReconnectConfig) -> Self {
        self.reconnect = reconnect;
        self
    }

    /// Validates the configuration.
    ///
    /// Returns a [`Configuration`](crate::ErrorKind::Configuration) error
    /// for an empty subject or URL.
    pub fn validate(&self) -> Result<()> {
        if self.subject.trim().is_empty() {
            return Err(Error::configuration("subject cannot be empty"));
        }
        if self.url.trim().is_empty() {
            return Err(Error::configuration("broker URL cannot be empty"));
        }
        if self.flush_timeout.is_zero() {
            return Err(Error::configuration("flush timeout cannot be zero"));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ConsumerConfig::new("events.>");
        assert_eq!(config.url, DEFAULT_BROKER_URL);
        assert_eq!(config.otlp_endpoint, DEFAULT_OTLP_ENDPOINT);
        assert_eq!(config.flush_timeout, DEFAULT_FLUSH_TIMEOUT);
        assert!(config.credentials_file.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = ConsumerConfig::new("orders.created")
            .with_url("nats://other:4222")
            .with_otlp_endpoint("http://collector:4317")
            .with_service_name("order-consumer")
            .with_flush_timeout(Duration::from_secs(2))
            .with_credentials_file("/etc/nats/user.creds");

        assert_eq!(config.url, "nats://other:4222");
        assert_eq!(config.service_name, "order-consumer");
        assert_eq!(
            config.credentials_file.as_deref(),
            Some(std::path::Path::new("/etc/nats/user.creds"))
        );
    }

    #[test]
    fn test_validate_empty_subject() {
        let config = ConsumerConfig::new("  ");
        let err = config.validate().unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Configuration);
    }

    #[test]
    fn test_validate_empty_url() {
        let config = ConsumerConfig::new("events").with_url("");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_flush_timeout() {
        let config = ConsumerConfig::new("events").with_flush_timeout(Duration::ZERO);
        assert!(config.validate().is_err());
    }
}
