//! Configuration management
//!
//! Optional YAML file with per-waiter intervals and timeouts. Every field has
//! a default, so an empty file (or no file) is a valid configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::operations::environment::DEFAULT_ENVIRONMENT_INTERVAL_SECS;
use crate::operations::{
    DEFAULT_CHANGE_SET_INTERVAL, DEFAULT_DEPLOYMENT_INTERVAL, DEFAULT_STACK_INTERVAL,
    DEFAULT_TIMEOUT_MINUTES,
};
use crate::waiter::{
    DEFAULT_FETCH_RETRIES, DEFAULT_FETCH_RETRY_DELAY, PollConfig, Validate, ValidationError,
    WaitTimeout,
};

const MAX_FETCH_RETRIES: u64 = 10;
const MAX_FETCH_RETRY_DELAY_SECS: u64 = 60;

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// File that was read.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The file is not valid YAML for [`Config`]
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        /// File that was parsed.
        path: PathBuf,
        /// Underlying error.
        source: serde_yaml::Error,
    },

    /// A value was rejected
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] ValidationError),
}

/// Interval and timeout for one kind of waiter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaiterSettings {
    /// Seconds between status checks
    pub interval_secs: u64,
    /// Overall limit in minutes; `null` waits without a limit
    #[serde(default = "default_timeout_minutes")]
    pub timeout_minutes: Option<u64>,
}

#[allow(clippy::unnecessary_wraps)]
fn default_timeout_minutes() -> Option<u64> {
    Some(DEFAULT_TIMEOUT_MINUTES)
}

impl WaiterSettings {
    /// Settings with a bounded timeout
    #[must_use]
    pub const fn new(interval_secs: u64, timeout_minutes: u64) -> Self {
        Self {
            interval_secs,
            timeout_minutes: Some(timeout_minutes),
        }
    }

    /// Timeout as a [`WaitTimeout`]
    #[must_use]
    pub fn timeout(&self) -> WaitTimeout {
        self.timeout_minutes
            .map_or(WaitTimeout::Unbounded, WaitTimeout::minutes)
    }
}

impl Validate for WaiterSettings {
    type Error = ValidationError;

    fn validate(&self) -> Result<(), Self::Error> {
        if self.interval_secs == 0 {
            return Err(ValidationError::ZeroInterval);
        }
        if self.timeout_minutes == Some(0) {
            return Err(ValidationError::InvalidTimeout {
                value: Duration::ZERO,
            });
        }
        Ok(())
    }
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level
    pub log_level: String,
    /// AWS region override
    pub region: Option<String>,
    /// AWS shared-config profile
    pub profile: Option<String>,
    /// Stack create, update, delete and change set execution
    pub stack: WaiterSettings,
    /// Change set creation
    pub change_set: WaiterSettings,
    /// Beanstalk environment deployments
    pub environment: WaiterSettings,
    /// CodeDeploy deployments
    pub deployment: WaiterSettings,
    /// Extra attempts for a failing status call within one poll
    pub fetch_retries: u32,
    /// Seconds between those attempts
    pub fetch_retry_delay_secs: u64,
    /// Keep polling through status call failures until the timeout
    pub treat_fetch_error_as_not_ready: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            region: None,
            profile: None,
            stack: WaiterSettings::new(DEFAULT_STACK_INTERVAL.as_secs(), DEFAULT_TIMEOUT_MINUTES),
            change_set: WaiterSettings::new(
                DEFAULT_CHANGE_SET_INTERVAL.as_secs(),
                DEFAULT_TIMEOUT_MINUTES,
            ),
            environment: WaiterSettings::new(
                DEFAULT_ENVIRONMENT_INTERVAL_SECS,
                DEFAULT_TIMEOUT_MINUTES,
            ),
            deployment: WaiterSettings::new(
                DEFAULT_DEPLOYMENT_INTERVAL.as_secs(),
                DEFAULT_TIMEOUT_MINUTES,
            ),
            fetch_retries: DEFAULT_FETCH_RETRIES,
            fetch_retry_delay_secs: DEFAULT_FETCH_RETRY_DELAY.as_secs(),
            treat_fetch_error_as_not_ready: false,
        }
    }
}

impl Config {
    /// Reads and validates a YAML configuration file
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read, parsed or validated.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Parses YAML without validating; empty input yields the defaults
    ///
    /// # Errors
    ///
    /// Returns the YAML error for malformed input.
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text)
    }

    /// Builds the poll configuration for one waiter
    #[must_use]
    pub fn poll_config(&self, settings: &WaiterSettings) -> PollConfig {
        PollConfig::new(Duration::from_secs(settings.interval_secs), settings.timeout())
            .with_fetch_retries(
                self.fetch_retries,
                Duration::from_secs(self.fetch_retry_delay_secs),
            )
            .with_fetch_errors_as_not_ready(self.treat_fetch_error_as_not_ready)
    }
}

impl Validate for Config {
    type Error = ValidationError;

    fn validate(&self) -> Result<(), Self::Error> {
        if self.log_level.trim().is_empty() {
            return Err(ValidationError::EmptyField("log level"));
        }
        for settings in [&self.stack, &self.change_set, &self.environment, &self.deployment] {
            settings.validate()?;
        }
        if u64::from(self.fetch_retries) > MAX_FETCH_RETRIES {
            return Err(ValidationError::OutOfRange {
                field: "fetch_retries",
                value: u64::from(self.fetch_retries),
                min: 0,
                max: MAX_FETCH_RETRIES,
            });
        }
        if self.fetch_retry_delay_secs > MAX_FETCH_RETRY_DELAY_SECS {
            return Err(ValidationError::OutOfRange {
                field: "fetch_retry_delay_secs",
                value: self.fetch_retry_delay_secs,
                min: 0,
                max: MAX_FETCH_RETRY_DELAY_SECS,
            });
        }
        Ok(())
    }
}
