//! CloudFormation interface

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ApiResult;
use crate::waiter::{EventRecord, StatusSnapshot, Validate, ValidationError};

/// Where a template comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateSource {
    /// Inline template text
    Body(String),
    /// Template stored in S3
    Url(String),
}

/// Inputs shared by stack create and update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackRequest {
    /// Stack name
    pub stack_name: String,
    /// Template location
    pub template: TemplateSource,
    /// Template parameters as key/value pairs
    #[serde(default)]
    pub parameters: Vec<(String, String)>,
    /// Capabilities such as `CAPABILITY_IAM`
    #[serde(default)]
    pub capabilities: Vec<String>,
}

impl StackRequest {
    /// Creates a request without parameters or capabilities
    pub fn new(stack_name: impl Into<String>, template: TemplateSource) -> Self {
        Self {
            stack_name: stack_name.into(),
            template,
            parameters: Vec::new(),
            capabilities: Vec::new(),
        }
    }

    /// Adds a template parameter
    #[must_use]
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.push((key.into(), value.into()));
        self
    }

    /// Adds a capability
    #[must_use]
    pub fn with_capability(mut self, capability: impl Into<String>) -> Self {
        self.capabilities.push(capability.into());
        self
    }
}

impl Validate for StackRequest {
    type Error = ValidationError;

    fn validate(&self) -> Result<(), Self::Error> {
        if self.stack_name.trim().is_empty() {
            return Err(ValidationError::EmptyField("stack name"));
        }
        match &self.template {
            TemplateSource::Body(body) if body.trim().is_empty() => {
                Err(ValidationError::EmptyField("template body"))
            }
            TemplateSource::Url(url) if url.trim().is_empty() => {
                Err(ValidationError::EmptyField("template URL"))
            }
            _ => Ok(()),
        }
    }
}

/// Whether a change set creates a new stack or updates an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeSetType {
    /// Stack does not exist yet
    Create,
    /// Stack already exists
    Update,
}

/// Inputs for creating a change set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSetRequest {
    /// Target stack
    pub stack: StackRequest,
    /// Change set name
    pub change_set_name: String,
    /// Create or update
    pub change_set_type: ChangeSetType,
    /// Optional description
    pub description: Option<String>,
}

impl Validate for ChangeSetRequest {
    type Error = ValidationError;

    fn validate(&self) -> Result<(), Self::Error> {
        self.stack.validate()?;
        if self.change_set_name.trim().is_empty() {
            return Err(ValidationError::EmptyField("change set name"));
        }
        Ok(())
    }
}

/// CloudFormation calls used by the stack tasks
#[async_trait]
pub trait CloudFormationApi: Send + Sync {
    /// Starts stack creation and returns the stack id
    async fn create_stack(&self, request: &StackRequest) -> ApiResult<String>;

    /// Starts a stack update and returns the stack id
    async fn update_stack(&self, request: &StackRequest) -> ApiResult<String>;

    /// Starts stack deletion
    async fn delete_stack(&self, stack_name: &str) -> ApiResult<()>;

    /// Creates a change set and returns its id
    async fn create_change_set(&self, request: &ChangeSetRequest) -> ApiResult<String>;

    /// Starts executing a change set
    async fn execute_change_set(&self, stack_name: &str, change_set_name: &str) -> ApiResult<()>;

    /// Current stack status and reason
    async fn describe_stack(&self, stack_name: &str) -> ApiResult<StatusSnapshot>;

    /// Current change set status and reason
    async fn describe_change_set(
        &self,
        stack_name: &str,
        change_set_name: &str,
    ) -> ApiResult<StatusSnapshot>;

    /// Stack events, newest first
    ///
    /// With `since`, every event newer than it is returned even when the
    /// service splits them over several pages. Without it, only the most
    /// recent page is read.
    async fn stack_events(
        &self,
        stack_name: &str,
        since: Option<DateTime<Utc>>,
    ) -> ApiResult<Vec<EventRecord>>;

    /// Whether the stack currently has any resources
    async fn stack_has_resources(&self, stack_name: &str) -> ApiResult<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stack_request_builder() {
        let request = StackRequest::new("web", TemplateSource::Url("https://bucket/t.yaml".into()))
            .with_parameter("Env", "prod")
            .with_capability("CAPABILITY_IAM");
        assert_eq!(request.parameters, vec![("Env".to_string(), "prod".to_string())]);
        assert_eq!(request.capabilities, vec!["CAPABILITY_IAM".to_string()]);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_stack_request_validation() {
        let request = StackRequest::new(" ", TemplateSource::Body("{}".into()));
        assert_eq!(request.validate(), Err(ValidationError::EmptyField("stack name")));

        let request = StackRequest::new("web", TemplateSource::Body(String::new()));
        assert_eq!(request.validate(), Err(ValidationError::EmptyField("template body")));
    }

    #[test]
    fn test_change_set_request_validation() {
        let request = ChangeSetRequest {
            stack: StackRequest::new("web", TemplateSource::Body("{}".into())),
            change_set_name: String::new(),
            change_set_type: ChangeSetType::Create,
            description: None,
        };
        assert_eq!(
            request.validate(),
            Err(ValidationError::EmptyField("change set name"))
        );
    }
}
