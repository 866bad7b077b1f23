//! Wait-for-completion engine
//!
//! A single poll loop ([`StatusPoller`]) shared by every long-running AWS
//! operation. Call sites supply a status fetch, a [`TerminalCheck`] and a
//! [`PollConfig`]; the poller handles sleeping, timeouts, fetch retries,
//! event deduplication and cancellation.

mod classifier;
mod config;
mod cursor;
mod errors;
mod poller;
mod progress;
mod types;

pub use classifier::{
    BEANSTALK_DEPLOY_FAILED, EnvironmentDeployCheck, ResourceKind, TerminalCheck, TerminalStates,
    classify, classify_snapshot, is_no_op,
};
pub use config::{
    DEFAULT_FETCH_RETRIES, DEFAULT_FETCH_RETRY_DELAY, PollConfig, Validate, WaitTimeout,
};
pub use cursor::EventCursor;
pub use errors::{FetchError, ValidationError, WaitError};
pub use poller::StatusPoller;
pub use progress::{ProgressSink, TracingProgress};
pub use types::{EventRecord, StatusSnapshot, TerminalState, WaitOutcome};
