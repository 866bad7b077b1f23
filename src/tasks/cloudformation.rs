//! CloudFormation stack and change set tasks

use std::sync::Arc;
use tracing::info;

use super::{TaskError, TaskOutcome};
use crate::api::{ChangeSetRequest, CloudFormationApi, StackRequest};
use crate::operations::{StackOperation, StackWaiter, WaitContext};
use crate::waiter::{PollConfig, Validate, is_no_op};

/// Stack lifecycle tasks
pub struct CloudFormationTasks {
    api: Arc<dyn CloudFormationApi>,
    waiter: StackWaiter,
}

impl CloudFormationTasks {
    /// Creates the tasks with default waiter settings
    pub fn new(api: Arc<dyn CloudFormationApi>, context: WaitContext) -> Self {
        Self {
            waiter: StackWaiter::new(Arc::clone(&api), context),
            api,
        }
    }

    /// Overrides stack and change set poll settings
    #[must_use]
    pub fn with_configs(mut self, stack: PollConfig, change_set: PollConfig) -> Self {
        self.waiter = self
            .waiter
            .with_stack_config(stack)
            .with_change_set_config(change_set);
        self
    }

    /// Creates a stack and waits for `CREATE_COMPLETE`
    ///
    /// # Errors
    ///
    /// Fails on invalid input, a rejected call or a failed wait.
    pub async fn create_stack(&self, request: &StackRequest) -> Result<TaskOutcome, TaskError> {
        request.validate()?;
        let cursor = self.waiter.capture_cursor(&request.stack_name).await;

        let stack_id = self.api.create_stack(request).await?;
        info!(stack = %request.stack_name, stack_id = %stack_id, "Stack creation started");

        let outcome = self
            .waiter
            .wait_for_stack(&request.stack_name, StackOperation::Create, cursor)
            .await?;
        Ok(TaskOutcome::from(outcome).with_id(stack_id))
    }

    /// Updates a stack and waits for `UPDATE_COMPLETE`
    ///
    /// An update the service rejects with "No updates are to be performed."
    /// succeeds as a no-op without waiting.
    ///
    /// # Errors
    ///
    /// Fails on invalid input, any other rejected call or a failed wait.
    pub async fn update_stack(&self, request: &StackRequest) -> Result<TaskOutcome, TaskError> {
        request.validate()?;
        let cursor = self.waiter.capture_cursor(&request.stack_name).await;

        let stack_id = match self.api.update_stack(request).await {
            Ok(stack_id) => stack_id,
            Err(err) if is_no_op(err.code(), &err.message) => {
                info!(stack = %request.stack_name, "No updates are to be performed");
                return Ok(TaskOutcome::unchanged(
                    format!("stack '{}'", request.stack_name),
                    StackOperation::Update.complete_status(),
                ));
            }
            Err(err) => return Err(err.into()),
        };
        info!(stack = %request.stack_name, stack_id = %stack_id, "Stack update started");

        let outcome = self
            .waiter
            .wait_for_stack(&request.stack_name, StackOperation::Update, cursor)
            .await?;
        Ok(TaskOutcome::from(outcome).with_id(stack_id))
    }

    /// Deletes a stack and waits until it is gone
    ///
    /// # Errors
    ///
    /// Fails on a rejected call or when deletion ends in `DELETE_FAILED`.
    pub async fn delete_stack(&self, stack_name: &str) -> Result<TaskOutcome, TaskError> {
        let cursor = self.waiter.capture_cursor(stack_name).await;

        self.api.delete_stack(stack_name).await?;
        info!(stack = stack_name, "Stack deletion started");

        let outcome = self
            .waiter
            .wait_for_stack(stack_name, StackOperation::Delete, cursor)
            .await?;
        Ok(outcome.into())
    }

    /// Creates a change set and waits for it to be ready for execution
    ///
    /// A change set without changes is reported as a no-op.
    ///
    /// # Errors
    ///
    /// Fails on invalid input, a rejected call or a failed change set.
    pub async fn create_change_set(
        &self,
        request: &ChangeSetRequest,
    ) -> Result<TaskOutcome, TaskError> {
        request.validate()?;

        let change_set_id = self.api.create_change_set(request).await?;
        info!(
            stack = %request.stack.stack_name,
            change_set = %request.change_set_name,
            "Change set creation started"
        );

        let outcome = self
            .waiter
            .wait_for_change_set(&request.stack.stack_name, &request.change_set_name)
            .await?;
        if outcome.no_op {
            info!(change_set = %request.change_set_name, "Change set contains no changes");
        }
        Ok(TaskOutcome::from(outcome).with_id(change_set_id))
    }

    /// Executes a change set and waits for the stack to settle
    ///
    /// # Errors
    ///
    /// Fails on a rejected call or a failed stack operation.
    pub async fn execute_change_set(
        &self,
        stack_name: &str,
        change_set_name: &str,
    ) -> Result<TaskOutcome, TaskError> {
        let had_resources = self.waiter.stack_has_resources(stack_name).await;
        let cursor = self.waiter.capture_cursor(stack_name).await;

        self.api.execute_change_set(stack_name, change_set_name).await?;
        info!(
            stack = stack_name,
            change_set = change_set_name,
            update = had_resources,
            "Change set execution started"
        );

        let outcome = self
            .waiter
            .wait_for_execution(stack_name, had_resources, cursor)
            .await?;
        Ok(outcome.into())
    }
}
