//! Interval-based status poller
//!
//! Drives an injected status fetch until a [`TerminalCheck`] reports a
//! terminal state, the wall-clock timeout elapses, or the cancellation token
//! fires. The poller does no I/O of its own beyond sleeping.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::classifier::TerminalCheck;
use super::config::{PollConfig, Validate, WaitTimeout};
use super::cursor::EventCursor;
use super::errors::{FetchError, WaitError, format_timeout};
use super::progress::ProgressSink;
use super::types::{EventRecord, StatusSnapshot, TerminalState, WaitOutcome};

/// Polls one resource until it settles
pub struct StatusPoller {
    resource: String,
    config: PollConfig,
    cursor: Option<EventCursor>,
    sink: Option<Arc<dyn ProgressSink>>,
    cancel: CancellationToken,
}

impl std::fmt::Debug for StatusPoller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusPoller")
            .field("resource", &self.resource)
            .field("config", &self.config)
            .field("cursor", &self.cursor)
            .field("has_sink", &self.sink.is_some())
            .finish_non_exhaustive()
    }
}

impl StatusPoller {
    /// Creates a poller for the named resource
    pub fn new(resource: impl Into<String>, config: PollConfig) -> Self {
        Self {
            resource: resource.into(),
            config,
            cursor: None,
            sink: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Deduplicates snapshot events against `cursor` before surfacing them
    #[must_use]
    pub fn with_cursor(mut self, cursor: EventCursor) -> Self {
        self.cursor = Some(cursor);
        self
    }

    /// Sends newly surfaced events to `sink`
    #[must_use]
    pub fn with_progress(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Stops polling when `token` is cancelled
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Runs the poll loop
    ///
    /// A failure classification resolves to `Ok` with `succeeded == false`;
    /// use [`WaitOutcome::into_result`] to raise it.
    ///
    /// # Errors
    ///
    /// Returns [`WaitError::OperationTimedOut`] when the timeout elapses while
    /// the resource is still running, [`WaitError::ResourceNotFound`] and
    /// [`WaitError::FetchFailed`] for status call failures, and
    /// [`WaitError::Cancelled`] when the token fires.
    pub async fn poll<F, Fut, C>(mut self, mut fetch: F, mut check: C) -> Result<WaitOutcome, WaitError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<StatusSnapshot, FetchError>>,
        C: TerminalCheck,
    {
        self.config.validate()?;

        let start = Instant::now();
        let deadline = self
            .config
            .timeout
            .as_duration()
            .and_then(|t| start.checked_add(t));
        let mut polls = 0u32;
        let mut last_status: Option<String> = None;

        info!(
            resource = %self.resource,
            interval_secs = self.config.interval.as_secs(),
            timeout = %describe_timeout(self.config.timeout),
            "Waiting for resource to reach a terminal state"
        );

        if self.config.delay_first_poll {
            self.pause(self.within(self.config.interval, deadline)).await?;
        }

        loop {
            if self.cancel.is_cancelled() {
                return Err(self.cancelled());
            }

            if let Some(snapshot) = self
                .fetch_with_retries(&mut fetch, deadline, last_status.as_deref())
                .await?
            {
                polls += 1;
                let new_events = self.surface_events(&snapshot);
                let state = check.check(&snapshot, &new_events);

                debug!(
                    resource = %self.resource,
                    status = %snapshot.status,
                    state = %state,
                    poll = polls,
                    "Polled status"
                );

                if state.is_terminal() {
                    let elapsed = start.elapsed();
                    info!(
                        resource = %self.resource,
                        status = %snapshot.status,
                        state = %state,
                        elapsed_secs = elapsed.as_secs(),
                        "Resource reached a terminal state"
                    );
                    return Ok(WaitOutcome {
                        error_detail: (!state.is_success()).then(|| snapshot.describe()),
                        resource: self.resource,
                        succeeded: state.is_success(),
                        no_op: state == TerminalState::NoOp,
                        final_snapshot: snapshot,
                        polls,
                        elapsed,
                    });
                }

                last_status = Some(snapshot.status);
            }

            if expired(deadline) {
                return Err(self.timed_out(last_status.as_deref()));
            }

            self.pause(self.within(self.config.interval, deadline)).await?;
        }
    }

    /// Calls `fetch`, retrying transient failures within the tick
    ///
    /// `Ok(None)` means the failure was swallowed as "not ready yet". A call
    /// still pending at the deadline is abandoned.
    async fn fetch_with_retries<F, Fut>(
        &self,
        fetch: &mut F,
        deadline: Option<Instant>,
        last_status: Option<&str>,
    ) -> Result<Option<StatusSnapshot>, WaitError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<StatusSnapshot, FetchError>>,
    {
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            let result = tokio::select! {
                biased;
                () = self.cancel.cancelled() => return Err(self.cancelled()),
                result = fetch() => result,
                () = until(deadline) => return Err(self.timed_out(last_status)),
            };

            match result {
                Ok(snapshot) => return Ok(Some(snapshot)),
                Err(e) if self.config.treat_fetch_error_as_not_ready => {
                    debug!(resource = %self.resource, error = %e, "Status not available yet");
                    return Ok(None);
                }
                Err(FetchError::NotFound(message)) => {
                    return Err(WaitError::ResourceNotFound {
                        resource: self.resource.clone(),
                        message,
                    });
                }
                Err(FetchError::Transient(error)) => {
                    if attempts > self.config.max_fetch_retries {
                        return Err(WaitError::FetchFailed {
                            resource: self.resource.clone(),
                            attempts,
                            error,
                        });
                    }
                    warn!(
                        resource = %self.resource,
                        attempt = attempts,
                        error = %error,
                        "Status call failed, retrying"
                    );
                    self.pause(self.within(self.config.fetch_retry_delay, deadline))
                        .await?;
                    if expired(deadline) {
                        return Err(self.timed_out(last_status));
                    }
                }
            }
        }
    }

    fn surface_events(&mut self, snapshot: &StatusSnapshot) -> Vec<EventRecord> {
        let new_events = match self.cursor.as_mut() {
            Some(cursor) => cursor.take_new(&snapshot.events),
            None => {
                let mut events = snapshot.events.clone();
                events.sort_by_key(|e| e.timestamp);
                events
            }
        };
        if !new_events.is_empty()
            && let Some(sink) = &self.sink
        {
            sink.on_progress(&new_events);
        }
        new_events
    }

    /// Shortens `pause` so it never runs past the deadline
    fn within(&self, pause: Duration, deadline: Option<Instant>) -> Duration {
        match deadline {
            Some(deadline) => pause.min(deadline.saturating_duration_since(Instant::now())),
            None => pause,
        }
    }

    async fn pause(&self, duration: Duration) -> Result<(), WaitError> {
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(self.cancelled()),
            () = tokio::time::sleep(duration) => Ok(()),
        }
    }

    fn timed_out(&self, last_status: Option<&str>) -> WaitError {
        warn!(
            resource = %self.resource,
            last_status = last_status.unwrap_or("unknown"),
            "Timed out waiting for resource"
        );
        WaitError::OperationTimedOut {
            resource: self.resource.clone(),
            timeout: self.config.timeout.as_duration().unwrap_or_default(),
            last_status: last_status.map(ToString::to_string),
        }
    }

    fn cancelled(&self) -> WaitError {
        WaitError::Cancelled {
            resource: self.resource.clone(),
        }
    }
}

fn expired(deadline: Option<Instant>) -> bool {
    deadline.is_some_and(|deadline| Instant::now() >= deadline)
}

/// Resolves at the deadline, or never when there is none
async fn until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

fn describe_timeout(timeout: WaitTimeout) -> String {
    match timeout {
        WaitTimeout::Bounded(d) => format_timeout(&d),
        WaitTimeout::Unbounded => "unbounded".to_string(),
    }
}
