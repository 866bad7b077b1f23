//! Systems Manager interface

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::ApiResult;
use crate::waiter::{Validate, ValidationError};

/// Inputs for `SendCommand`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandRequest {
    /// SSM document to run, e.g. `AWS-RunShellScript`
    pub document_name: String,
    /// Target instances
    pub instance_ids: Vec<String>,
    /// Document parameters
    #[serde(default)]
    pub parameters: BTreeMap<String, Vec<String>>,
    /// Free-form comment shown in the console
    pub comment: Option<String>,
    /// Seconds the command may wait to start on an instance
    pub timeout_seconds: Option<i32>,
}

impl Validate for CommandRequest {
    type Error = ValidationError;

    fn validate(&self) -> Result<(), Self::Error> {
        if self.document_name.trim().is_empty() {
            return Err(ValidationError::EmptyField("document name"));
        }
        if self.instance_ids.is_empty() {
            return Err(ValidationError::EmptyField("instance ids"));
        }
        Ok(())
    }
}

/// Systems Manager calls used by the run-command task
#[async_trait]
pub trait SsmApi: Send + Sync {
    /// Sends a command and returns its id
    async fn send_command(&self, request: &CommandRequest) -> ApiResult<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_request_validation() {
        let mut request = CommandRequest {
            document_name: "AWS-RunShellScript".to_string(),
            ..Default::default()
        };
        assert_eq!(request.validate(), Err(ValidationError::EmptyField("instance ids")));

        request.instance_ids.push("i-0123456789abcdef0".to_string());
        assert!(request.validate().is_ok());
    }
}
