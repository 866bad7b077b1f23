//! CloudFormation stack and change set waiters

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::DateTime;
use tracing::{debug, warn};

use super::{
    DEFAULT_CHANGE_SET_INTERVAL, DEFAULT_STACK_INTERVAL, DEFAULT_TIMEOUT_MINUTES, WaitContext,
    resource_name,
};
use crate::api::CloudFormationApi;
use crate::waiter::{
    EventCursor, EventRecord, FetchError, PollConfig, ResourceKind, StatusPoller, StatusSnapshot,
    TerminalCheck, TerminalState, TerminalStates, WaitError, WaitOutcome, WaitTimeout, classify,
};

const DELETE_COMPLETE: &str = "DELETE_COMPLETE";

/// The mutating call a stack wait follows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackOperation {
    /// `CreateStack` or a create-type change set
    Create,
    /// `UpdateStack` or an update-type change set
    Update,
    /// `DeleteStack`
    Delete,
}

impl StackOperation {
    /// Status that completes this operation
    #[must_use]
    pub fn complete_status(self) -> &'static str {
        match self {
            Self::Create => "CREATE_COMPLETE",
            Self::Update => "UPDATE_COMPLETE",
            Self::Delete => DELETE_COMPLETE,
        }
    }
}

impl fmt::Display for StackOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// Create and update succeed only on their own `_COMPLETE` status; any other
/// settled status that the stack rules call a success means the operation has
/// not taken effect yet. Delete ignores everything but its own two outcomes so
/// a stack sitting in `ROLLBACK_COMPLETE` can still be deleted.
impl TerminalCheck for StackOperation {
    fn check(&mut self, snapshot: &StatusSnapshot, _new_events: &[EventRecord]) -> TerminalState {
        if *self == Self::Delete {
            return TerminalStates::new(&[DELETE_COMPLETE], &["DELETE_FAILED"])
                .classify(&snapshot.status);
        }
        match classify(ResourceKind::Stack, &snapshot.status) {
            TerminalState::Success if snapshot.status != self.complete_status() => {
                TerminalState::StillRunning
            }
            state => state,
        }
    }
}

/// Waits on CloudFormation stacks and change sets
pub struct StackWaiter {
    api: Arc<dyn CloudFormationApi>,
    stack_config: PollConfig,
    change_set_config: PollConfig,
    context: WaitContext,
}

impl StackWaiter {
    /// Creates a waiter with default intervals and a 60 minute timeout
    pub fn new(api: Arc<dyn CloudFormationApi>, context: WaitContext) -> Self {
        let timeout = WaitTimeout::minutes(DEFAULT_TIMEOUT_MINUTES);
        Self {
            api,
            stack_config: PollConfig::new(DEFAULT_STACK_INTERVAL, timeout),
            change_set_config: PollConfig::new(DEFAULT_CHANGE_SET_INTERVAL, timeout),
            context,
        }
    }

    /// Overrides the stack poll configuration
    #[must_use]
    pub fn with_stack_config(mut self, config: PollConfig) -> Self {
        self.stack_config = config;
        self
    }

    /// Overrides the change set poll configuration
    #[must_use]
    pub fn with_change_set_config(mut self, config: PollConfig) -> Self {
        self.change_set_config = config;
        self
    }

    /// Positions a cursor after the events the stack already has
    ///
    /// Call before the mutating request so the wait only narrates events it
    /// caused. A missing stack yields a cursor at the current time.
    pub async fn capture_cursor(&self, stack_name: &str) -> EventCursor {
        match self.api.stack_events(stack_name, None).await {
            Ok(events) => EventCursor::from_existing(&events),
            Err(err) => {
                debug!(stack = stack_name, error = %err, "No prior stack events");
                EventCursor::from_existing(&[])
            }
        }
    }

    /// Whether the stack already has resources
    ///
    /// Decides between create and update semantics when executing a change
    /// set. Lookup failures count as "no resources".
    pub async fn stack_has_resources(&self, stack_name: &str) -> bool {
        match self.api.stack_has_resources(stack_name).await {
            Ok(has_resources) => has_resources,
            Err(err) => {
                debug!(stack = stack_name, error = %err, "Resource lookup failed");
                false
            }
        }
    }

    /// Waits for a stack operation to finish
    ///
    /// # Errors
    ///
    /// Returns [`WaitError::OperationFailed`] when the stack settles in a
    /// failed or rolled-back state, and the poller's errors otherwise.
    pub async fn wait_for_stack(
        &self,
        stack_name: &str,
        operation: StackOperation,
        cursor: EventCursor,
    ) -> Result<WaitOutcome, WaitError> {
        let api = Arc::clone(&self.api);
        let name = stack_name.to_string();
        let watermark = Arc::new(AtomicI64::new(cursor.watermark().timestamp_millis()));
        let fetch = move || {
            let api = Arc::clone(&api);
            let name = name.clone();
            let watermark = Arc::clone(&watermark);
            async move { fetch_stack(api.as_ref(), &name, operation, &watermark).await }
        };

        StatusPoller::new(resource_name("stack", stack_name), self.stack_config.clone())
            .with_cursor(cursor)
            .with_progress(Arc::clone(&self.context.sink))
            .with_cancellation(self.context.cancel.clone())
            .poll(fetch, operation)
            .await?
            .into_result()
    }

    /// Waits for a change set to finish computing
    ///
    /// A change set that failed only because it contains no changes resolves
    /// with `no_op` set.
    ///
    /// # Errors
    ///
    /// Returns [`WaitError::OperationFailed`] for any other failed change set.
    pub async fn wait_for_change_set(
        &self,
        stack_name: &str,
        change_set_name: &str,
    ) -> Result<WaitOutcome, WaitError> {
        let api = Arc::clone(&self.api);
        let stack = stack_name.to_string();
        let change_set = change_set_name.to_string();
        let fetch = move || {
            let api = Arc::clone(&api);
            let stack = stack.clone();
            let change_set = change_set.clone();
            async move {
                api.describe_change_set(&stack, &change_set)
                    .await
                    .map_err(FetchError::from)
            }
        };

        StatusPoller::new(
            resource_name(ResourceKind::ChangeSet, change_set_name),
            self.change_set_config.clone(),
        )
        .with_cancellation(self.context.cancel.clone())
        .poll(fetch, ResourceKind::ChangeSet)
        .await?
        .into_result()
    }

    /// Waits for an executed change set to settle the stack
    ///
    /// `had_resources` comes from [`stack_has_resources`](Self::stack_has_resources)
    /// taken before execution.
    ///
    /// # Errors
    ///
    /// Same as [`wait_for_stack`](Self::wait_for_stack).
    pub async fn wait_for_execution(
        &self,
        stack_name: &str,
        had_resources: bool,
        cursor: EventCursor,
    ) -> Result<WaitOutcome, WaitError> {
        let operation = if had_resources {
            StackOperation::Update
        } else {
            StackOperation::Create
        };
        self.wait_for_stack(stack_name, operation, cursor).await
    }
}

/// Reads the stack status and the events after `watermark`
///
/// `watermark` holds the newest event timestamp fetched so far, in
/// milliseconds, and moves forward with every successful event read.
async fn fetch_stack(
    api: &dyn CloudFormationApi,
    stack_name: &str,
    operation: StackOperation,
    watermark: &AtomicI64,
) -> Result<StatusSnapshot, FetchError> {
    let snapshot = match api.describe_stack(stack_name).await {
        Ok(snapshot) => snapshot,
        Err(err) if err.not_found && operation == StackOperation::Delete => {
            return Ok(StatusSnapshot::new(DELETE_COMPLETE));
        }
        Err(err) => return Err(err.into()),
    };

    let since = DateTime::from_timestamp_millis(watermark.load(Ordering::Relaxed));
    match api.stack_events(stack_name, since).await {
        Ok(events) => {
            if let Some(latest) = events.iter().map(|e| e.timestamp).max() {
                watermark.fetch_max(latest.timestamp_millis(), Ordering::Relaxed);
            }
            Ok(snapshot.with_events(events))
        }
        Err(err) => {
            warn!(stack = stack_name, error = %err, "Could not read stack events");
            Ok(snapshot)
        }
    }
}
