//! Poll configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::errors::ValidationError;

/// Default number of extra attempts for a failing status call within one tick
pub const DEFAULT_FETCH_RETRIES: u32 = 3;

/// Default pause between status call retries
pub const DEFAULT_FETCH_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Trait for types that can be validated
#[allow(clippy::missing_errors_doc)]
pub trait Validate {
    /// Type of validation error
    type Error;

    /// Validates this type
    fn validate(&self) -> std::result::Result<(), Self::Error>;
}

/// Upper bound on how long a wait may run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitTimeout {
    /// Give up after this much wall-clock time
    Bounded(Duration),
    /// Wait until a terminal state or cancellation
    Unbounded,
}

impl WaitTimeout {
    /// Bounded timeout in whole minutes
    ///
    /// A value too large to express in seconds is treated as unbounded.
    #[must_use]
    pub fn minutes(minutes: u64) -> Self {
        minutes
            .checked_mul(60)
            .map_or(Self::Unbounded, |secs| Self::Bounded(Duration::from_secs(secs)))
    }

    /// Bounded timeout in seconds
    #[must_use]
    pub fn seconds(seconds: u64) -> Self {
        Self::Bounded(Duration::from_secs(seconds))
    }

    /// The bound, if any
    #[must_use]
    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            Self::Bounded(d) => Some(*d),
            Self::Unbounded => None,
        }
    }
}

/// How a single wait call polls
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollConfig {
    /// Pause between status checks
    pub interval: Duration,
    /// Overall wall-clock limit
    pub timeout: WaitTimeout,
    /// Sleep one interval before the first status check
    pub delay_first_poll: bool,
    /// Extra attempts for a transient status call failure within one tick
    pub max_fetch_retries: u32,
    /// Pause between those attempts
    pub fetch_retry_delay: Duration,
    /// Treat every status call failure as "not ready yet" until the timeout
    pub treat_fetch_error_as_not_ready: bool,
}

impl PollConfig {
    /// Creates a configuration with default retry behaviour
    #[must_use]
    pub fn new(interval: Duration, timeout: WaitTimeout) -> Self {
        Self {
            interval,
            timeout,
            delay_first_poll: false,
            max_fetch_retries: DEFAULT_FETCH_RETRIES,
            fetch_retry_delay: DEFAULT_FETCH_RETRY_DELAY,
            treat_fetch_error_as_not_ready: false,
        }
    }

    /// Sleeps one interval before the first check
    #[must_use]
    pub fn with_initial_delay(mut self, delay: bool) -> Self {
        self.delay_first_poll = delay;
        self
    }

    /// Sets the per-tick retry budget for status calls
    #[must_use]
    pub fn with_fetch_retries(mut self, retries: u32, delay: Duration) -> Self {
        self.max_fetch_retries = retries;
        self.fetch_retry_delay = delay;
        self
    }

    /// Swallows status call failures as "not ready yet"
    #[must_use]
    pub fn with_fetch_errors_as_not_ready(mut self, enabled: bool) -> Self {
        self.treat_fetch_error_as_not_ready = enabled;
        self
    }
}

impl Validate for PollConfig {
    type Error = ValidationError;

    fn validate(&self) -> Result<(), Self::Error> {
        if self.interval.is_zero() {
            return Err(ValidationError::ZeroInterval);
        }
        if let WaitTimeout::Bounded(value) = self.timeout
            && value.is_zero()
        {
            return Err(ValidationError::InvalidTimeout { value });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PollConfig::new(Duration::from_secs(15), WaitTimeout::minutes(60));
        assert_eq!(config.timeout.as_duration(), Some(Duration::from_secs(3600)));
        assert_eq!(config.max_fetch_retries, DEFAULT_FETCH_RETRIES);
        assert!(!config.delay_first_poll);
        assert!(!config.treat_fetch_error_as_not_ready);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let config = PollConfig::new(Duration::ZERO, WaitTimeout::Unbounded);
        assert_eq!(config.validate(), Err(ValidationError::ZeroInterval));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = PollConfig::new(Duration::from_secs(1), WaitTimeout::seconds(0));
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidTimeout { .. })
        ));
    }

    #[test]
    fn test_huge_minutes_become_unbounded() {
        assert_eq!(WaitTimeout::minutes(u64::MAX), WaitTimeout::Unbounded);
        assert_eq!(
            WaitTimeout::minutes(u64::MAX / 60),
            WaitTimeout::Bounded(Duration::from_secs(u64::MAX / 60 * 60))
        );
    }

    #[test]
    fn test_unbounded_has_no_duration() {
        assert_eq!(WaitTimeout::Unbounded.as_duration(), None);
    }
}
