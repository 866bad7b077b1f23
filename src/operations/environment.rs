//! Elastic Beanstalk environment deployment waiter

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::{DEFAULT_TIMEOUT_MINUTES, WaitContext, resource_name};
use crate::api::BeanstalkApi;
use crate::waiter::{
    BEANSTALK_DEPLOY_FAILED, EnvironmentDeployCheck, EventCursor, FetchError, PollConfig,
    ResourceKind, StatusPoller, TerminalState, WaitError, WaitOutcome, WaitTimeout, classify,
};

/// Default environment poll interval in seconds
pub const DEFAULT_ENVIRONMENT_INTERVAL_SECS: u64 = 5;

/// Smallest accepted environment poll interval in seconds
pub const MIN_ENVIRONMENT_INTERVAL_SECS: u64 = 5;

/// Largest accepted environment poll interval in seconds
pub const MAX_ENVIRONMENT_INTERVAL_SECS: u64 = 300;

/// Resolves a requested environment poll interval
///
/// Values outside 5..=300 seconds fall back to the default with a warning.
#[must_use]
pub fn environment_interval(seconds: u64) -> Duration {
    if (MIN_ENVIRONMENT_INTERVAL_SECS..=MAX_ENVIRONMENT_INTERVAL_SECS).contains(&seconds) {
        Duration::from_secs(seconds)
    } else {
        warn!(
            requested = seconds,
            default = DEFAULT_ENVIRONMENT_INTERVAL_SECS,
            "Environment poll interval out of range ({MIN_ENVIRONMENT_INTERVAL_SECS}-{MAX_ENVIRONMENT_INTERVAL_SECS}s), using default"
        );
        Duration::from_secs(DEFAULT_ENVIRONMENT_INTERVAL_SECS)
    }
}

/// Waits for an environment to finish deploying an application version
pub struct EnvironmentWaiter {
    api: Arc<dyn BeanstalkApi>,
    config: PollConfig,
    context: WaitContext,
}

impl EnvironmentWaiter {
    /// Creates a waiter polling every 5 seconds for up to 60 minutes
    pub fn new(api: Arc<dyn BeanstalkApi>, context: WaitContext) -> Self {
        Self {
            api,
            config: PollConfig::new(
                Duration::from_secs(DEFAULT_ENVIRONMENT_INTERVAL_SECS),
                WaitTimeout::minutes(DEFAULT_TIMEOUT_MINUTES),
            ),
            context,
        }
    }

    /// Overrides the poll configuration
    ///
    /// The interval is clamped through [`environment_interval`].
    #[must_use]
    pub fn with_config(mut self, config: PollConfig) -> Self {
        let interval = environment_interval(config.interval.as_secs());
        self.config = PollConfig { interval, ..config };
        self
    }

    /// Positions a cursor after the newest event the environment already has
    ///
    /// Call before the update request. The watermark comes from the service's
    /// own timestamps, so a local clock running ahead cannot hide the events
    /// the deployment produces. Lookup failures fall back to the current time.
    pub async fn capture_cursor(&self, application: &str, environment: &str) -> EventCursor {
        match self.api.describe_events(application, environment, None).await {
            Ok(events) => EventCursor::from_existing(&events),
            Err(err) => {
                debug!(environment, error = %err, "No prior environment events");
                EventCursor::from_existing(&[])
            }
        }
    }

    /// Waits until the environment leaves `Launching`/`Updating`
    ///
    /// Each tick reads the environment status and the events after the
    /// cursor's watermark concurrently. The deployment succeeds only if the
    /// environment is `Ready` and no event reported [`BEANSTALK_DEPLOY_FAILED`].
    ///
    /// # Errors
    ///
    /// Returns [`WaitError::OperationFailed`] when either signal reports a
    /// failure, and the poller's errors otherwise.
    pub async fn wait_for_deployment(
        &self,
        application: &str,
        environment: &str,
        cursor: EventCursor,
    ) -> Result<WaitOutcome, WaitError> {
        let since = Some(cursor.watermark());
        let api = Arc::clone(&self.api);
        let app = application.to_string();
        let env = environment.to_string();
        let fetch = move || {
            let api = Arc::clone(&api);
            let app = app.clone();
            let env = env.clone();
            async move {
                let (snapshot, events) = tokio::try_join!(
                    api.describe_environment(&app, &env),
                    api.describe_events(&app, &env, since),
                )
                .map_err(FetchError::from)?;
                Ok(snapshot.with_events(events))
            }
        };

        let mut outcome = StatusPoller::new(
            resource_name(ResourceKind::Environment, environment),
            self.config.clone(),
        )
        .with_cursor(cursor)
        .with_progress(Arc::clone(&self.context.sink))
        .with_cancellation(self.context.cancel.clone())
        .poll(fetch, EnvironmentDeployCheck::new())
        .await?;

        let status = &outcome.final_snapshot.status;
        if !outcome.succeeded
            && classify(ResourceKind::Environment, status) == TerminalState::Success
        {
            outcome.error_detail = Some(format!(
                "events reported '{BEANSTALK_DEPLOY_FAILED}' while the environment is {status}"
            ));
        }
        outcome.into_result()
    }
}
