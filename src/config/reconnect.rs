//! Reconnect configuration for transient broker connectivity loss.

use std::time::Duration;

/// Configuration for reconnect behavior when the broker connection drops.
///
/// The consumer uses a fixed delay between reconnect attempts and bounds
/// the total time spent reconnecting by a cumulative backoff ceiling.
/// Bounding the window prevents an orphaned process from retrying forever
/// against a permanently unreachable broker, while still tolerating brief
/// network blips without operator intervention.
///
/// ## Default Values
///
/// - `delay`: 1s between attempts
/// - `ceiling`: 10 minutes of cumulative backoff (~600 attempts)
///
/// ## Example
///
/// ```rust
/// use spanlink::ReconnectConfig;
/// use std::time::Duration;
///
/// let config = ReconnectConfig::new()
///     .with_delay(Duration::from_millis(500))
///     .with_ceiling(Duration::from_secs(60));
/// assert_eq!(config.max_attempts(), 120);
/// ```
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Fixed delay between reconnect attempts.
    pub delay: Duration,

    /// Ceiling on cumulative backoff; exceeding it is fatal.
    pub ceiling: Duration,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(1),
            ceiling: Duration::from_secs(600),
        }
    }
}

impl ReconnectConfig {
    /// Creates a new reconnect configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the fixed delay between reconnect attempts.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Sets the cumulative backoff ceiling.
    #[must_use]
    pub fn with_ceiling(mut self, ceiling: Duration) -> Self {
        self.ceiling = ceiling;
        self
    }

    /// Returns the number of attempts that fit under the ceiling.
    ///
    /// With the defaults (1s delay, 10 minute ceiling) this is 600.
    pub fn max_attempts(&self) -> u32 {
        if self.delay.is_zero() {
            return 0;
        }
        (self.ceiling.as_millis() / self.delay.as_millis()) as u32
    }

    /// Returns `true` if `elapsed` cumulative backoff exceeds the ceiling.
    pub fn is_exhausted(&self, elapsed: Duration) -> bool {
        elapsed > self.ceiling
    }
}
