//! CodeDeploy deployment waiter

use std::sync::Arc;

use super::{DEFAULT_DEPLOYMENT_INTERVAL, DEFAULT_TIMEOUT_MINUTES, WaitContext, resource_name};
use crate::api::CodeDeployApi;
use crate::waiter::{
    FetchError, PollConfig, ResourceKind, StatusPoller, WaitError, WaitOutcome, WaitTimeout,
};

/// Waits for a CodeDeploy deployment to succeed
pub struct DeploymentWaiter {
    api: Arc<dyn CodeDeployApi>,
    config: PollConfig,
    context: WaitContext,
}

impl DeploymentWaiter {
    /// Creates a waiter polling every 15 seconds for up to 60 minutes
    pub fn new(api: Arc<dyn CodeDeployApi>, context: WaitContext) -> Self {
        Self {
            api,
            config: PollConfig::new(
                DEFAULT_DEPLOYMENT_INTERVAL,
                WaitTimeout::minutes(DEFAULT_TIMEOUT_MINUTES),
            ),
            context,
        }
    }

    /// Overrides the poll configuration
    #[must_use]
    pub fn with_config(mut self, config: PollConfig) -> Self {
        self.config = config;
        self
    }

    /// Waits until the deployment is `Succeeded`
    ///
    /// # Errors
    ///
    /// Returns [`WaitError::OperationFailed`] for `Failed` and `Stopped`
    /// deployments, and the poller's errors otherwise.
    pub async fn wait_for_deployment(&self, deployment_id: &str) -> Result<WaitOutcome, WaitError> {
        let api = Arc::clone(&self.api);
        let id = deployment_id.to_string();
        let fetch = move || {
            let api = Arc::clone(&api);
            let id = id.clone();
            async move { api.get_deployment(&id).await.map_err(FetchError::from) }
        };

        StatusPoller::new(
            resource_name(ResourceKind::Deployment, deployment_id),
            self.config.clone(),
        )
        .with_cancellation(self.context.cancel.clone())
        .poll(fetch, ResourceKind::Deployment)
        .await?
        .into_result()
    }
}
