//! Prelude module for common imports

// Waiter engine
pub use crate::waiter::{
    EventCursor, EventRecord, FetchError, PollConfig, ProgressSink, ResourceKind, StatusPoller,
    StatusSnapshot, TerminalCheck, TerminalState, TerminalStates, TracingProgress, Validate,
    ValidationError, WaitError, WaitOutcome, WaitTimeout, classify, is_no_op,
};

// Service interfaces
pub use crate::api::{
    ApiError, ApiResult, BeanstalkApi, ChangeSetRequest, ChangeSetType, CloudFormationApi,
    CodeDeployApi, CommandRequest, SsmApi, StackRequest, TemplateSource,
};

// Waiters and tasks
pub use crate::operations::{
    DeploymentWaiter, EnvironmentWaiter, StackOperation, StackWaiter, WaitContext,
};
pub use crate::tasks::{
    BeanstalkTasks, CloudFormationTasks, CodeDeployTasks, SsmTasks, TaskError, TaskOutcome,
};
