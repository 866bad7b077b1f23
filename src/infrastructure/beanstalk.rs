//! Elastic Beanstalk client backed by the AWS SDK

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_elasticbeanstalk::Client;
use aws_sdk_elasticbeanstalk::types::EventDescription;
use chrono::{DateTime, Utc};

use super::aws::{EventPages, api_error, from_utc, to_utc};
use crate::api::{ApiError, ApiResult, BeanstalkApi};
use crate::waiter::{EventRecord, StatusSnapshot};

const SERVICE: &str = "ElasticBeanstalk";

/// [`BeanstalkApi`] over an SDK client
#[derive(Debug, Clone)]
pub struct BeanstalkClient {
    client: Client,
}

impl BeanstalkClient {
    /// Wraps an existing SDK client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a client from shared SDK configuration
    pub fn from_config(config: &SdkConfig) -> Self {
        Self::new(Client::new(config))
    }
}

fn event_record(event: &EventDescription) -> Option<EventRecord> {
    let timestamp = to_utc(event.event_date()?)?;
    Some(EventRecord::new(
        timestamp,
        event.severity().map_or("INFO", |s| s.as_str()),
        event.message().unwrap_or_default(),
    ))
}

#[async_trait]
impl BeanstalkApi for BeanstalkClient {
    async fn update_environment(
        &self,
        application: &str,
        environment: &str,
        version_label: &str,
    ) -> ApiResult<()> {
        self.client
            .update_environment()
            .application_name(application)
            .environment_name(environment)
            .version_label(version_label)
            .send()
            .await
            .map_err(|e| api_error(SERVICE, "UpdateEnvironment", &e))?;
        Ok(())
    }

    async fn describe_environment(
        &self,
        application: &str,
        environment: &str,
    ) -> ApiResult<StatusSnapshot> {
        let output = self
            .client
            .describe_environments()
            .application_name(application)
            .environment_names(environment)
            .include_deleted(false)
            .send()
            .await
            .map_err(|e| api_error(SERVICE, "DescribeEnvironments", &e))?;

        let env = output.environments().first().ok_or_else(|| {
            ApiError::not_found(
                SERVICE,
                "DescribeEnvironments",
                format!("No environment named {environment} in application {application}"),
            )
        })?;
        let snapshot = StatusSnapshot::new(env.status().map_or("Unknown", |s| s.as_str()));
        Ok(match env.health() {
            Some(health) => snapshot.with_reason(format!("health {}", health.as_str())),
            None => snapshot,
        })
    }

    async fn describe_events(
        &self,
        application: &str,
        environment: &str,
        since: Option<DateTime<Utc>>,
    ) -> ApiResult<Vec<EventRecord>> {
        let mut pages = self
            .client
            .describe_events()
            .application_name(application)
            .environment_name(environment)
            .set_start_time(since.map(from_utc))
            .into_paginator()
            .send();
        let mut collected = EventPages::since(since);
        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| api_error(SERVICE, "DescribeEvents", &e))?;
            if !collected.push(page.events().iter().filter_map(event_record)) {
                break;
            }
        }
        Ok(collected.into_events())
    }
}
