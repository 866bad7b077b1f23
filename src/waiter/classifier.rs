//! Terminal state classification
//!
//! Maps raw service status strings to [`TerminalState`] per resource kind,
//! including the "nothing to update" suppression that turns a validation
//! failure into a successful no-op.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::types::{EventRecord, StatusSnapshot, TerminalState};

/// Message Elastic Beanstalk emits when an application version fails to deploy
pub const BEANSTALK_DEPLOY_FAILED: &str = "Failed to deploy application.";

/// Error codes that may carry a "nothing to update" message
const NO_OP_CODES: &[&str] = &["ValidationError", "FAILED"];

static NO_OP_MESSAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(no updates are to be performed|the submitted information didn't contain changes)",
    )
    .expect("no-op pattern is valid")
});

/// Kinds of long-running resources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// CloudFormation stack
    Stack,
    /// CloudFormation change set
    ChangeSet,
    /// Elastic Beanstalk environment
    Environment,
    /// SSM command invocation
    Command,
    /// CodeDeploy deployment
    Deployment,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stack => write!(f, "stack"),
            Self::ChangeSet => write!(f, "change set"),
            Self::Environment => write!(f, "environment"),
            Self::Command => write!(f, "command"),
            Self::Deployment => write!(f, "deployment"),
        }
    }
}

/// Classifies a raw status string for the given resource kind
#[must_use]
pub fn classify(kind: ResourceKind, status: &str) -> TerminalState {
    match kind {
        ResourceKind::Stack => classify_stack(status),
        ResourceKind::ChangeSet => match status {
            "CREATE_COMPLETE" => TerminalState::Success,
            "FAILED" | "DELETE_FAILED" => TerminalState::Failure,
            _ => TerminalState::StillRunning,
        },
        ResourceKind::Environment => match status {
            "Launching" | "Updating" => TerminalState::StillRunning,
            "Ready" => TerminalState::Success,
            _ => TerminalState::Failure,
        },
        ResourceKind::Command => match status {
            "Success" => TerminalState::Success,
            "Failed" | "Cancelled" | "TimedOut" => TerminalState::Failure,
            _ => TerminalState::StillRunning,
        },
        ResourceKind::Deployment => match status {
            "Succeeded" => TerminalState::Success,
            "Failed" | "Stopped" => TerminalState::Failure,
            _ => TerminalState::StillRunning,
        },
    }
}

fn classify_stack(status: &str) -> TerminalState {
    if status == "ROLLBACK_COMPLETE" || status.ends_with("_ROLLBACK_COMPLETE") {
        TerminalState::Failure
    } else if status.ends_with("_FAILED") {
        TerminalState::Failure
    } else if status.ends_with("_COMPLETE") {
        TerminalState::Success
    } else {
        TerminalState::StillRunning
    }
}

/// Classifies a snapshot, applying no-op suppression to failures
///
/// The status string doubles as the error code: a change set that ends in
/// `FAILED` because it has no changes is a no-op rather than a failure.
#[must_use]
pub fn classify_snapshot(kind: ResourceKind, snapshot: &StatusSnapshot) -> TerminalState {
    suppress_no_op(classify(kind, &snapshot.status), snapshot)
}

/// Turns a failure whose reason means "no changes" into [`TerminalState::NoOp`]
fn suppress_no_op(state: TerminalState, snapshot: &StatusSnapshot) -> TerminalState {
    if state == TerminalState::Failure
        && let Some(reason) = snapshot.reason.as_deref()
        && is_no_op(&snapshot.status, reason)
    {
        return TerminalState::NoOp;
    }
    state
}

/// Returns true when an error code and message mean "nothing to update"
#[must_use]
pub fn is_no_op(code: &str, message: &str) -> bool {
    NO_OP_CODES.contains(&code) && NO_OP_MESSAGE.is_match(message)
}

/// Explicit success and failure status lists
///
/// Statuses in neither list keep the wait running.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalStates {
    /// Statuses that end the wait successfully
    #[serde(default)]
    pub success: Vec<String>,
    /// Statuses that end the wait with a failure
    #[serde(default)]
    pub failure: Vec<String>,
}

impl TerminalStates {
    /// Creates a table from string slices
    pub fn new<S: AsRef<str>>(success: &[S], failure: &[S]) -> Self {
        Self {
            success: success.iter().map(|s| s.as_ref().to_string()).collect(),
            failure: failure.iter().map(|s| s.as_ref().to_string()).collect(),
        }
    }

    /// Classifies a status against the table
    #[must_use]
    pub fn classify(&self, status: &str) -> TerminalState {
        if self.success.iter().any(|s| s == status) {
            TerminalState::Success
        } else if self.failure.iter().any(|s| s == status) {
            TerminalState::Failure
        } else {
            TerminalState::StillRunning
        }
    }
}

/// Decides whether a freshly fetched snapshot ends the wait
///
/// `new_events` holds the events surfaced in this tick, after watermark
/// filtering. Implementations may keep state across ticks.
pub trait TerminalCheck: Send {
    /// Classifies the snapshot
    fn check(&mut self, snapshot: &StatusSnapshot, new_events: &[EventRecord]) -> TerminalState;
}

impl<F> TerminalCheck for F
where
    F: FnMut(&StatusSnapshot) -> TerminalState + Send,
{
    fn check(&mut self, snapshot: &StatusSnapshot, _new_events: &[EventRecord]) -> TerminalState {
        self(snapshot)
    }
}

impl TerminalCheck for ResourceKind {
    fn check(&mut self, snapshot: &StatusSnapshot, _new_events: &[EventRecord]) -> TerminalState {
        classify_snapshot(*self, snapshot)
    }
}

impl TerminalCheck for TerminalStates {
    fn check(&mut self, snapshot: &StatusSnapshot, _new_events: &[EventRecord]) -> TerminalState {
        suppress_no_op(self.classify(&snapshot.status), snapshot)
    }
}

/// Beanstalk deployment check
///
/// Combines the coarse environment status with a scan of event messages for
/// [`BEANSTALK_DEPLOY_FAILED`]. Once the phrase has been seen the deployment
/// is a failure, whatever the environment status says afterwards.
#[derive(Debug, Clone, Default)]
pub struct EnvironmentDeployCheck {
    failure_seen: bool,
}

impl EnvironmentDeployCheck {
    /// Creates a check with no failure recorded
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true once the failure phrase has been observed
    #[must_use]
    pub fn failure_seen(&self) -> bool {
        self.failure_seen
    }
}

impl TerminalCheck for EnvironmentDeployCheck {
    fn check(&mut self, snapshot: &StatusSnapshot, new_events: &[EventRecord]) -> TerminalState {
        if new_events
            .iter()
            .any(|e| e.message.contains(BEANSTALK_DEPLOY_FAILED))
        {
            self.failure_seen = true;
        }

        match classify(ResourceKind::Environment, &snapshot.status) {
            TerminalState::StillRunning => TerminalState::StillRunning,
            _ if self.failure_seen => TerminalState::Failure,
            state => state,
        }
    }
}
