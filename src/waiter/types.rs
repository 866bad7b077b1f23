//! Core types for the waiter
//!
//! Snapshots, events and outcomes exchanged between the poll loop and the
//! call sites that configure it.

#![allow(clippy::must_use_candidate)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use super::errors::WaitError;

/// A single progress event reported by the service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// When the service recorded the event
    pub timestamp: DateTime<Utc>,
    /// Service-specific severity or resource status, e.g. `INFO` or `CREATE_FAILED`
    pub severity: String,
    /// Human-readable message
    pub message: String,
    /// Logical resource the event belongs to, when the service reports one
    pub resource: Option<String>,
}

impl EventRecord {
    /// Creates an event without a resource name
    pub fn new(
        timestamp: DateTime<Utc>,
        severity: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            severity: severity.into(),
            message: message.into(),
            resource: None,
        }
    }

    /// Attaches the logical resource name
    #[must_use]
    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }
}

impl fmt::Display for EventRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ts = self.timestamp.format("%Y-%m-%d %H:%M:%S UTC");
        match &self.resource {
            Some(resource) => write!(f, "{ts} {resource} {} {}", self.severity, self.message),
            None => write!(f, "{ts} {} {}", self.severity, self.message),
        }
    }
}

/// Status of a resource at one point in time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSnapshot {
    /// Raw status string, e.g. `CREATE_IN_PROGRESS`
    pub status: String,
    /// Optional reason attached to the status
    pub reason: Option<String>,
    /// Events fetched alongside the status, in service order
    pub events: Vec<EventRecord>,
    /// When the snapshot was taken
    pub observed_at: DateTime<Utc>,
}

impl StatusSnapshot {
    /// Creates a snapshot with only a status string
    pub fn new(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            reason: None,
            events: Vec::new(),
            observed_at: Utc::now(),
        }
    }

    /// Attaches a status reason
    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches the events fetched in the same tick
    #[must_use]
    pub fn with_events(mut self, events: Vec<EventRecord>) -> Self {
        self.events = events;
        self
    }

    /// Status and reason in one line, for error messages
    pub fn describe(&self) -> String {
        match self.reason.as_deref() {
            Some(reason) if !reason.is_empty() => format!("{} ({reason})", self.status),
            _ => self.status.clone(),
        }
    }
}

/// Classification of a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalState {
    /// Keep polling
    StillRunning,
    /// Finished successfully
    Success,
    /// Finished successfully without changing anything
    NoOp,
    /// Finished with a failure
    Failure,
}

impl TerminalState {
    /// Returns true if polling must stop
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::StillRunning)
    }

    /// Returns true for `Success` and `NoOp`
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success | Self::NoOp)
    }
}

impl fmt::Display for TerminalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StillRunning => write!(f, "STILL_RUNNING"),
            Self::Success => write!(f, "SUCCESS"),
            Self::NoOp => write!(f, "NO_OP"),
            Self::Failure => write!(f, "FAILURE"),
        }
    }
}

/// Result of one wait call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitOutcome {
    /// Human-readable resource name the wait was for
    pub resource: String,
    /// True for `Success` and `NoOp`
    pub succeeded: bool,
    /// True when the service reported nothing to do
    pub no_op: bool,
    /// The snapshot that ended the wait
    pub final_snapshot: StatusSnapshot,
    /// Failure detail, set only when `succeeded` is false
    pub error_detail: Option<String>,
    /// Number of successful status fetches
    pub polls: u32,
    /// Wall-clock time spent waiting
    pub elapsed: Duration,
}

impl WaitOutcome {
    /// Converts a failed outcome into [`WaitError::OperationFailed`]
    #[allow(clippy::missing_errors_doc)]
    pub fn into_result(self) -> Result<Self, WaitError> {
        if self.succeeded {
            return Ok(self);
        }
        Err(WaitError::OperationFailed {
            status: self.final_snapshot.status.clone(),
            detail: self
                .error_detail
                .clone()
                .unwrap_or_else(|| self.final_snapshot.describe()),
            resource: self.resource,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn outcome(succeeded: bool) -> WaitOutcome {
        WaitOutcome {
            resource: "stack 'web'".to_string(),
            succeeded,
            no_op: false,
            final_snapshot: StatusSnapshot::new("CREATE_FAILED").with_reason("Bucket exists"),
            error_detail: (!succeeded).then(|| "CREATE_FAILED (Bucket exists)".to_string()),
            polls: 3,
            elapsed: Duration::from_secs(30),
        }
    }

    #[test]
    fn test_terminal_state_predicates() {
        assert!(!TerminalState::StillRunning.is_terminal());
        assert!(TerminalState::Success.is_terminal());
        assert!(TerminalState::NoOp.is_success());
        assert!(!TerminalState::Failure.is_success());
        assert_eq!(TerminalState::NoOp.to_string(), "NO_OP");
    }

    #[test]
    fn test_snapshot_describe() {
        assert_eq!(StatusSnapshot::new("READY").describe(), "READY");
        assert_eq!(
            StatusSnapshot::new("FAILED").with_reason("boom").describe(),
            "FAILED (boom)"
        );
    }

    #[test]
    fn test_into_result_failure() {
        let err = outcome(false).into_result().unwrap_err();
        match err {
            WaitError::OperationFailed { status, detail, .. } => {
                assert_eq!(status, "CREATE_FAILED");
                assert!(detail.contains("Bucket exists"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_into_result_success() {
        assert!(outcome(true).into_result().is_ok());
    }

    #[test]
    fn test_event_display() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let event = EventRecord::new(ts, "CREATE_IN_PROGRESS", "Resource creation Initiated")
            .with_resource("Bucket");
        assert_eq!(
            event.to_string(),
            "2024-01-02 03:04:05 UTC Bucket CREATE_IN_PROGRESS Resource creation Initiated"
        );
    }
}
