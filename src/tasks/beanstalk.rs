//! Elastic Beanstalk deploy task

use std::sync::Arc;
use tracing::info;

use super::{TaskError, TaskOutcome};
use crate::api::BeanstalkApi;
use crate::operations::{EnvironmentWaiter, WaitContext};
use crate::waiter::{PollConfig, ValidationError};

/// Deploys application versions to Beanstalk environments
pub struct BeanstalkTasks {
    api: Arc<dyn BeanstalkApi>,
    waiter: EnvironmentWaiter,
}

impl BeanstalkTasks {
    /// Creates the task with default waiter settings
    pub fn new(api: Arc<dyn BeanstalkApi>, context: WaitContext) -> Self {
        Self {
            waiter: EnvironmentWaiter::new(Arc::clone(&api), context),
            api,
        }
    }

    /// Overrides the environment poll settings
    #[must_use]
    pub fn with_config(mut self, config: PollConfig) -> Self {
        self.waiter = self.waiter.with_config(config);
        self
    }

    /// Switches the environment to `version_label` and waits for the rollout
    ///
    /// Only events newer than the environment's latest event before the
    /// request are narrated and checked for failures.
    ///
    /// # Errors
    ///
    /// Fails on empty names, a rejected update or a failed deployment.
    pub async fn deploy_version(
        &self,
        application: &str,
        environment: &str,
        version_label: &str,
    ) -> Result<TaskOutcome, TaskError> {
        for (field, value) in [
            ("application name", application),
            ("environment name", environment),
            ("version label", version_label),
        ] {
            if value.trim().is_empty() {
                return Err(ValidationError::EmptyField(field).into());
            }
        }

        let cursor = self.waiter.capture_cursor(application, environment).await;
        self.api
            .update_environment(application, environment, version_label)
            .await?;
        info!(
            application,
            environment,
            version = version_label,
            "Environment update started"
        );

        let outcome = self
            .waiter
            .wait_for_deployment(application, environment, cursor)
            .await?;
        Ok(TaskOutcome::from(outcome).with_id(version_label))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeBeanstalk, at, snapshot};
    use chrono::Utc;
    use crate::waiter::{EventRecord, WaitError, WaitTimeout};
    use std::time::Duration;

    fn tasks(api: Arc<FakeBeanstalk>) -> BeanstalkTasks {
        BeanstalkTasks::new(api, WaitContext::default())
            .with_config(PollConfig::new(Duration::from_secs(5), WaitTimeout::minutes(2)))
    }

    #[tokio::test(start_paused = true)]
    async fn test_deploy_version() {
        let api = Arc::new(FakeBeanstalk::new(
            vec![snapshot("Updating"), snapshot("Ready")],
            vec![Vec::new()],
        ));

        let outcome = tasks(Arc::clone(&api))
            .deploy_version("shop", "shop-prod", "v42")
            .await
            .unwrap();

        assert_eq!(outcome.status, "Ready");
        assert_eq!(outcome.id.as_deref(), Some("v42"));
        assert_eq!(api.calls()[0], "UpdateEnvironment shop-prod v42");
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_rollout_fails_the_task() {
        let failed = EventRecord::new(
            Utc::now() + chrono::Duration::seconds(30),
            "ERROR",
            "Failed to deploy application.",
        );
        let api = Arc::new(FakeBeanstalk::new(
            vec![snapshot("Updating"), snapshot("Ready")],
            vec![vec![failed]],
        ));

        let err = tasks(api)
            .deploy_version("shop", "shop-prod", "v42")
            .await
            .unwrap_err();

        assert!(matches!(err, TaskError::Wait(WaitError::OperationFailed { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_stamped_behind_local_clock_fails_the_task() {
        let api = Arc::new(
            FakeBeanstalk::new(
                vec![snapshot("Updating"), snapshot("Ready")],
                vec![vec![
                    EventRecord::new(at(5), "ERROR", "Failed to deploy application."),
                    EventRecord::new(at(0), "INFO", "Environment update completed successfully."),
                ]],
            )
            .with_prior_events(vec![EventRecord::new(
                at(0),
                "INFO",
                "Environment update completed successfully.",
            )]),
        );
        assert!(at(5) < Utc::now());

        let err = tasks(Arc::clone(&api))
            .deploy_version("shop", "shop-prod", "v42")
            .await
            .unwrap_err();

        assert!(matches!(err, TaskError::Wait(WaitError::OperationFailed { .. })));
        assert_eq!(api.event_queries()[..2], [None, Some(at(0))]);
    }

    #[tokio::test]
    async fn test_empty_version_label_is_rejected() {
        let api = Arc::new(FakeBeanstalk::new(Vec::new(), Vec::new()));

        let err = tasks(Arc::clone(&api))
            .deploy_version("shop", "shop-prod", " ")
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            TaskError::Validation(ValidationError::EmptyField("version label"))
        ));
        assert!(api.calls().is_empty());
    }
}
