//! Per-resource waiters
//!
//! Each waiter binds a [`StatusPoller`](crate::waiter::StatusPoller) to one
//! describe call, one terminal check and, where the service has an event log,
//! an [`EventCursor`](crate::waiter::EventCursor).

pub mod deployment;
pub mod environment;
pub mod stack;

pub use deployment::DeploymentWaiter;
pub use environment::{EnvironmentWaiter, environment_interval};
pub use stack::{StackOperation, StackWaiter};

use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::waiter::{ProgressSink, TracingProgress};

/// Default stack poll interval
pub const DEFAULT_STACK_INTERVAL: Duration = Duration::from_secs(15);

/// Default change set poll interval
pub const DEFAULT_CHANGE_SET_INTERVAL: Duration = Duration::from_secs(10);

/// Default CodeDeploy poll interval
pub const DEFAULT_DEPLOYMENT_INTERVAL: Duration = Duration::from_secs(15);

/// Default timeout for every waiter, in minutes
pub const DEFAULT_TIMEOUT_MINUTES: u64 = 60;

/// Progress sink and cancellation token shared by the waiters of one task
#[derive(Clone)]
pub struct WaitContext {
    /// Where surfaced events go
    pub sink: Arc<dyn ProgressSink>,
    /// Stops every wait started from this context
    pub cancel: CancellationToken,
}

impl WaitContext {
    /// Creates a context that logs events through tracing
    #[must_use]
    pub fn new(cancel: CancellationToken) -> Self {
        Self {
            sink: Arc::new(TracingProgress),
            cancel,
        }
    }

    /// Replaces the progress sink
    #[must_use]
    pub fn with_progress(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.sink = sink;
        self
    }
}

impl Default for WaitContext {
    fn default() -> Self {
        Self::new(CancellationToken::new())
    }
}

impl std::fmt::Debug for WaitContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WaitContext")
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

/// Display name used in logs and errors, e.g. `stack 'web'`
pub(crate) fn resource_name(kind: impl std::fmt::Display, name: &str) -> String {
    format!("{kind} '{name}'")
}
