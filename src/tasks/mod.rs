//! Pipeline task operations
//!
//! Each task issues one mutating call through an injected service client and
//! then hands off to the matching waiter.

mod beanstalk;
mod cloudformation;
mod codedeploy;
mod ssm;

pub use beanstalk::BeanstalkTasks;
pub use cloudformation::CloudFormationTasks;
pub use codedeploy::CodeDeployTasks;
pub use ssm::SsmTasks;

use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::api::ApiError;
use crate::waiter::{ValidationError, WaitError, WaitOutcome};

/// Errors that fail a task
#[derive(Error, Debug)]
pub enum TaskError {
    /// A service call was rejected
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The wait after the call failed
    #[error(transparent)]
    Wait(#[from] WaitError),

    /// Task input was rejected before calling the service
    #[error("Invalid task input: {0}")]
    Validation(#[from] ValidationError),
}

/// Result reported back to the pipeline step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskOutcome {
    /// Resource the task acted on, e.g. `stack 'web'`
    pub resource: String,
    /// Last status seen
    pub status: String,
    /// Nothing needed to change
    pub no_op: bool,
    /// Identifier returned by the service (stack id, command id, ...)
    pub id: Option<String>,
}

impl TaskOutcome {
    /// Outcome for a resource that needed no changes
    pub fn unchanged(resource: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            status: status.into(),
            no_op: true,
            id: None,
        }
    }

    /// Attaches a service identifier
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

impl From<WaitOutcome> for TaskOutcome {
    fn from(outcome: WaitOutcome) -> Self {
        Self {
            resource: outcome.resource,
            status: outcome.final_snapshot.status,
            no_op: outcome.no_op,
            id: None,
        }
    }
}

impl fmt::Display for TaskOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.no_op {
            write!(f, "{}: no changes ({})", self.resource, self.status)?;
        } else {
            write!(f, "{}: {}", self.resource, self.status)?;
        }
        if let Some(id) = &self.id {
            write!(f, " [{id}]")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_display() {
        let outcome = TaskOutcome {
            resource: "stack 'web'".to_string(),
            status: "CREATE_COMPLETE".to_string(),
            no_op: false,
            id: None,
        }
        .with_id("arn:stack/web");
        assert_eq!(outcome.to_string(), "stack 'web': CREATE_COMPLETE [arn:stack/web]");

        let unchanged = TaskOutcome::unchanged("stack 'web'", "UPDATE_COMPLETE");
        assert_eq!(unchanged.to_string(), "stack 'web': no changes (UPDATE_COMPLETE)");
    }

    #[test]
    fn test_wait_errors_keep_their_message() {
        let err = TaskError::from(WaitError::Cancelled {
            resource: "stack 'web'".to_string(),
        });
        assert_eq!(err.to_string(), "Wait for stack 'web' was cancelled");
    }
}
