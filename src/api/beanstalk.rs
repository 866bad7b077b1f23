//! Elastic Beanstalk interface

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::ApiResult;
use crate::waiter::{EventRecord, StatusSnapshot};

/// Elastic Beanstalk calls used by the deploy task
#[async_trait]
pub trait BeanstalkApi: Send + Sync {
    /// Points the environment at an existing application version
    async fn update_environment(
        &self,
        application: &str,
        environment: &str,
        version_label: &str,
    ) -> ApiResult<()>;

    /// Coarse environment status (`Launching`, `Updating`, `Ready`, ...)
    async fn describe_environment(
        &self,
        application: &str,
        environment: &str,
    ) -> ApiResult<StatusSnapshot>;

    /// Environment events, newest first
    ///
    /// With `since`, all events from that time on across every page. Without
    /// it, only the most recent page.
    async fn describe_events(
        &self,
        application: &str,
        environment: &str,
        since: Option<DateTime<Utc>>,
    ) -> ApiResult<Vec<EventRecord>>;
}
