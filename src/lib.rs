//! # aws-pipeline-tasks - AWS deployment steps for CI/CD pipelines
//!
//! Pipeline tasks that start a long-running AWS operation and wait for it to
//! settle: CloudFormation stacks and change sets, Elastic Beanstalk
//! deployments and CodeDeploy deployments, plus fire-and-forget SSM commands.
//!
//! ## Layers
//!
//! - [`waiter`]: the generic wait-for-completion engine. A [`StatusPoller`]
//!   calls an injected status fetch on an interval, classifies each snapshot
//!   with a [`TerminalCheck`], narrates new events through an [`EventCursor`]
//!   and enforces a wall-clock timeout and a cancellation token.
//! - [`operations`]: waiters bound to one AWS describe call each.
//! - [`tasks`]: the mutating call followed by the matching waiter.
//! - [`api`]: narrow traits over the AWS calls, so tasks run against fakes in
//!   tests.
//! - [`infrastructure`]: SDK-backed clients, configuration and logging.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use aws_pipeline_tasks::api::{StackRequest, TemplateSource};
//! use aws_pipeline_tasks::infrastructure::{CloudFormationClient, load_sdk_config};
//! use aws_pipeline_tasks::operations::WaitContext;
//! use aws_pipeline_tasks::tasks::CloudFormationTasks;
//!
//! # async fn deploy() -> Result<(), Box<dyn std::error::Error>> {
//! let sdk = load_sdk_config(Some("eu-west-1"), None).await;
//! let tasks = CloudFormationTasks::new(
//!     Arc::new(CloudFormationClient::from_config(&sdk)),
//!     WaitContext::default(),
//! );
//! let request = StackRequest::new("web", TemplateSource::Url("https://bucket.s3.amazonaws.com/web.yaml".into()))
//!     .with_parameter("Env", "prod");
//! let outcome = tasks.create_stack(&request).await?;
//! println!("{outcome}");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod api;
pub mod infrastructure;
pub mod operations;
pub mod tasks;
pub mod waiter;

// Prelude module for common imports
pub mod prelude;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use api::{ApiError, ApiResult};
pub use infrastructure::{Config, ConfigError, init_logging};
pub use tasks::{TaskError, TaskOutcome};
pub use waiter::{
    EventCursor, EventRecord, PollConfig, ProgressSink, StatusPoller, StatusSnapshot,
    TerminalCheck, TerminalState, WaitError, WaitOutcome, WaitTimeout,
};

/// Version of the aws-pipeline-tasks crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
