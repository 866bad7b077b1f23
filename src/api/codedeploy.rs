//! CodeDeploy interface

use async_trait::async_trait;

use super::ApiResult;
use crate::waiter::StatusSnapshot;

/// CodeDeploy calls used by the deployment waiter
#[async_trait]
pub trait CodeDeployApi: Send + Sync {
    /// Deployment status with the error message, if any, as reason
    async fn get_deployment(&self, deployment_id: &str) -> ApiResult<StatusSnapshot>;
}
