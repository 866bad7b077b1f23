//! Error types for the wait-for-completion engine

use std::time::Duration;
use thiserror::Error;

/// Errors that end a wait call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WaitError {
    /// The resource did not exist when the wait started
    #[error("{resource} does not exist: {message}")]
    ResourceNotFound {
        /// Human-readable resource name, e.g. `stack 'web'`.
        resource: String,
        /// Message returned by the status call.
        message: String,
    },

    /// A terminal failure state was reached
    #[error("{resource} failed with status {status}: {detail}")]
    OperationFailed {
        /// Human-readable resource name.
        resource: String,
        /// Last status string reported by the service.
        status: String,
        /// Failure detail derived from the final snapshot.
        detail: String,
    },

    /// The resource was still in progress when the timeout elapsed
    #[error("{resource} did not reach a terminal state within {} (last status: {})", format_timeout(.timeout), .last_status.as_deref().unwrap_or("unknown"))]
    OperationTimedOut {
        /// Human-readable resource name.
        resource: String,
        /// The configured timeout.
        timeout: Duration,
        /// Last status seen before giving up.
        last_status: Option<String>,
    },

    /// The status call kept failing after all retries in a tick
    #[error("Failed to fetch status of {resource} after {attempts} attempts: {error}")]
    FetchFailed {
        /// Human-readable resource name.
        resource: String,
        /// Number of attempts made in the failing tick.
        attempts: u32,
        /// Last error message.
        error: String,
    },

    /// The wait was cancelled from outside
    #[error("Wait for {resource} was cancelled")]
    Cancelled {
        /// Human-readable resource name.
        resource: String,
    },

    /// Poll configuration was rejected
    #[error("Invalid wait configuration: {0}")]
    InvalidConfig(#[from] ValidationError),
}

impl WaitError {
    /// Returns true if this is a timeout rather than a resource failure
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::OperationTimedOut { .. })
    }
}

/// Errors returned by an injected status fetch
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The resource is not known to the service (yet)
    #[error("not found: {0}")]
    NotFound(String),

    /// Network blip, throttling or any other retryable failure
    #[error("{0}")]
    Transient(String),
}

/// Validation errors for poll configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Poll interval must be positive
    #[error("Invalid poll interval: must be positive")]
    ZeroInterval,

    /// A bounded timeout must be positive
    #[error("Invalid timeout: must be positive, got {value:?}")]
    InvalidTimeout {
        /// The invalid timeout value.
        value: Duration,
    },

    /// Value outside its allowed range
    #[error("Invalid {field}: {value} is outside {min}..={max}")]
    OutOfRange {
        /// Name of the setting.
        field: &'static str,
        /// Supplied value.
        value: u64,
        /// Lower bound.
        min: u64,
        /// Upper bound.
        max: u64,
    },

    /// Required identifier missing
    #[error("{0} cannot be empty")]
    EmptyField(&'static str),
}

/// Renders a timeout in whole minutes when possible, seconds otherwise
pub(crate) fn format_timeout(timeout: &Duration) -> String {
    let secs = timeout.as_secs();
    if secs >= 60 && secs % 60 == 0 {
        let minutes = secs / 60;
        if minutes == 1 {
            "1 minute".to_string()
        } else {
            format!("{minutes} minutes")
        }
    } else if secs == 1 {
        "1 second".to_string()
    } else {
        format!("{secs} seconds")
    }
}
