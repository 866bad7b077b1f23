//! Systems Manager client backed by the AWS SDK

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_ssm::Client;

use super::aws::api_error;
use crate::api::{ApiError, ApiResult, CommandRequest, SsmApi};

const SERVICE: &str = "SSM";

/// [`SsmApi`] over an SDK client
#[derive(Debug, Clone)]
pub struct SsmClient {
    client: Client,
}

impl SsmClient {
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
impl SsmApi for SsmClient {
    async fn send_command(&self, request: &CommandRequest) -> ApiResult<String> {
        let mut builder = self
            .client
            .send_command()
            .document_name(&request.document_name)
            .set_instance_ids(Some(request.instance_ids.clone()))
            .set_comment(request.comment.clone())
            .set_timeout_seconds(request.timeout_seconds);
        for (name, values) in &request.parameters {
            builder = builder.parameters(name, values.clone());
        }

        let output = builder
            .send()
            .await
            .map_err(|e| api_error(SERVICE, "SendCommand", &e))?;
        output
            .command()
            .and_then(|c| c.command_id())
            .map(str::to_string)
            .ok_or_else(|| ApiError::new(SERVICE, "SendCommand", None, "response carried no command id"))
    }
}
