//! Service interfaces
//!
//! Narrow traits over the AWS calls the tasks make. The SDK-backed
//! implementations live in [`crate::infrastructure`]; tests drive the tasks
//! through in-memory implementations.

mod beanstalk;
mod cloudformation;
mod codedeploy;
mod ssm;

pub use beanstalk::BeanstalkApi;
pub use cloudformation::{ChangeSetRequest, ChangeSetType, CloudFormationApi, StackRequest, TemplateSource};
pub use codedeploy::CodeDeployApi;
pub use ssm::{CommandRequest, SsmApi};

use thiserror::Error;

use crate::waiter::FetchError;

/// Result type for service calls
pub type ApiResult<T> = Result<T, ApiError>;

/// A failed service call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{service} {operation} failed: {message}")]
pub struct ApiError {
    /// Service name, e.g. `CloudFormation`
    pub service: &'static str,
    /// API operation, e.g. `DescribeStacks`
    pub operation: &'static str,
    /// Service error code, when one was returned
    pub code: Option<String>,
    /// Error message
    pub message: String,
    /// The addressed resource does not exist
    pub not_found: bool,
}

impl ApiError {
    /// Creates an error from a service response
    pub fn new(
        service: &'static str,
        operation: &'static str,
        code: Option<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            service,
            operation,
            code,
            message: message.into(),
            not_found: false,
        }
    }

    /// Creates a "resource does not exist" error
    pub fn not_found(
        service: &'static str,
        operation: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            not_found: true,
            ..Self::new(service, operation, None, message)
        }
    }

    /// Marks the error as "resource does not exist"
    #[must_use]
    pub fn with_not_found(mut self, not_found: bool) -> Self {
        self.not_found = not_found;
        self
    }

    /// Error code, or an empty string
    #[must_use]
    pub fn code(&self) -> &str {
        self.code.as_deref().unwrap_or_default()
    }
}

impl From<ApiError> for FetchError {
    fn from(err: ApiError) -> Self {
        if err.not_found {
            Self::NotFound(err.message)
        } else {
            Self::Transient(err.to_string())
        }
    }
}
