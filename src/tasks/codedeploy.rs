//! CodeDeploy wait task

use std::sync::Arc;

use super::{TaskError, TaskOutcome};
use crate::api::CodeDeployApi;
use crate::operations::{DeploymentWaiter, WaitContext};
use crate::waiter::{PollConfig, ValidationError};

/// Waits on deployments started elsewhere in the pipeline
pub struct CodeDeployTasks {
    waiter: DeploymentWaiter,
}

impl CodeDeployTasks {
    /// Creates the task with default waiter settings
    pub fn new(api: Arc<dyn CodeDeployApi>, context: WaitContext) -> Self {
        Self {
            waiter: DeploymentWaiter::new(api, context),
        }
    }

    /// Overrides the deployment poll settings
    #[must_use]
    pub fn with_config(mut self, config: PollConfig) -> Self {
        self.waiter = self.waiter.with_config(config);
        self
    }

    /// Waits for `deployment_id` to succeed
    ///
    /// # Errors
    ///
    /// Fails on an empty id or a failed, stopped or timed-out deployment.
    pub async fn wait_for_deployment(&self, deployment_id: &str) -> Result<TaskOutcome, TaskError> {
        if deployment_id.trim().is_empty() {
            return Err(ValidationError::EmptyField("deployment id").into());
        }
        let outcome = self.waiter.wait_for_deployment(deployment_id).await?;
        Ok(TaskOutcome::from(outcome).with_id(deployment_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeCodeDeploy, snapshot};
    use crate::waiter::{WaitError, WaitTimeout};
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_failed_deployment() {
        let api = Arc::new(FakeCodeDeploy::new(vec![snapshot("InProgress"), snapshot("Failed")]));
        let tasks = CodeDeployTasks::new(api, WaitContext::default())
            .with_config(PollConfig::new(Duration::from_secs(1), WaitTimeout::seconds(30)));

        let err = tasks.wait_for_deployment("d-ABC123").await.unwrap_err();

        assert!(matches!(
            err,
            TaskError::Wait(WaitError::OperationFailed { ref status, .. }) if status == "Failed"
        ));
    }
}
