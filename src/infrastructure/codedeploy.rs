//! CodeDeploy client backed by the AWS SDK

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_codedeploy::Client;

use super::aws::api_error;
use crate::api::{ApiError, ApiResult, CodeDeployApi};
use crate::waiter::StatusSnapshot;

const SERVICE: &str = "CodeDeploy";

/// [`CodeDeployApi`] over an SDK client
#[derive(Debug, Clone)]
pub struct CodeDeployClient {
    client: Client,
}

impl CodeDeployClient {
    /// Wraps an existing SDK client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a client from shared SDK configuration
    pub fn from_config(config: &SdkConfig) -> Self {
        Self::new(Client::new(config))
    }
}

#[async_trait]
impl CodeDeployApi for CodeDeployClient {
    async fn get_deployment(&self, deployment_id: &str) -> ApiResult<StatusSnapshot> {
        let output = self
            .client
            .get_deployment()
            .deployment_id(deployment_id)
            .send()
            .await
            .map_err(|e| {
                let err = api_error(SERVICE, "GetDeployment", &e);
                let not_found = err.code() == "DeploymentDoesNotExistException";
                err.with_not_found(not_found)
            })?;

        let info = output.deployment_info().ok_or_else(|| {
            ApiError::not_found(
                SERVICE,
                "GetDeployment",
                format!("Deployment {deployment_id} does not exist"),
            )
        })?;
        let snapshot = StatusSnapshot::new(info.status().map_or("Unknown", |s| s.as_str()));
        Ok(match info.error_information().and_then(|e| e.message()) {
            Some(message) => snapshot.with_reason(message),
            None => snapshot,
        })
    }
}
