//! CloudFormation client backed by the AWS SDK

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_cloudformation::Client;
use aws_sdk_cloudformation::types::{self, Capability, Parameter, StackEvent};
use chrono::{DateTime, Utc};

use super::aws::{EventPages, api_error, to_utc};
use crate::api::{
    ApiError, ApiResult, ChangeSetRequest, ChangeSetType, CloudFormationApi, StackRequest,
    TemplateSource,
};
use crate::waiter::{EventRecord, StatusSnapshot};

const SERVICE: &str = "CloudFormation";

/// [`CloudFormationApi`] over an SDK client
#[derive(Debug, Clone)]
pub struct CloudFormationClient {
    client: Client,
}

impl CloudFormationClient {
    /// Wraps an existing SDK client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a client from shared SDK configuration
    pub fn from_config(config: &SdkConfig) -> Self {
        Self::new(Client::new(config))
    }
}

/// Missing stacks come back as a generic validation error
fn missing_stack(err: ApiError) -> ApiError {
    let not_found = err.code() == "ValidationError" && err.message.contains("does not exist");
    err.with_not_found(not_found)
}

fn parameters(request: &StackRequest) -> Vec<Parameter> {
    request
        .parameters
        .iter()
        .map(|(key, value)| {
            Parameter::builder()
                .parameter_key(key)
                .parameter_value(value)
                .build()
        })
        .collect()
}

fn capabilities(request: &StackRequest) -> Vec<Capability> {
    request
        .capabilities
        .iter()
        .map(|c| Capability::from(c.as_str()))
        .collect()
}

fn stack_event(event: &StackEvent) -> Option<EventRecord> {
    let timestamp = to_utc(event.timestamp()?)?;
    let severity = event.resource_status().map_or("UNKNOWN", |s| s.as_str());
    let record = EventRecord::new(
        timestamp,
        severity,
        event.resource_status_reason().unwrap_or_default(),
    );
    Some(match event.logical_resource_id() {
        Some(resource) => record.with_resource(resource),
        None => record,
    })
}

#[async_trait]
impl CloudFormationApi for CloudFormationClient {
    async fn create_stack(&self, request: &StackRequest) -> ApiResult<String> {
        let builder = self
            .client
            .create_stack()
            .stack_name(&request.stack_name)
            .set_parameters(Some(parameters(request)))
            .set_capabilities(Some(capabilities(request)));
        let builder = match &request.template {
            TemplateSource::Body(body) => builder.template_body(body),
            TemplateSource::Url(url) => builder.template_url(url),
        };
        let output = builder
            .send()
            .await
            .map_err(|e| api_error(SERVICE, "CreateStack", &e))?;
        Ok(output.stack_id().unwrap_or(&request.stack_name).to_string())
    }

    async fn update_stack(&self, request: &StackRequest) -> ApiResult<String> {
        let builder = self
            .client
            .update_stack()
            .stack_name(&request.stack_name)
            .set_parameters(Some(parameters(request)))
            .set_capabilities(Some(capabilities(request)));
        let builder = match &request.template {
            TemplateSource::Body(body) => builder.template_body(body),
            TemplateSource::Url(url) => builder.template_url(url),
        };
        let output = builder
            .send()
            .await
            .map_err(|e| api_error(SERVICE, "UpdateStack", &e))?;
        Ok(output.stack_id().unwrap_or(&request.stack_name).to_string())
    }

    async fn delete_stack(&self, stack_name: &str) -> ApiResult<()> {
        self.client
            .delete_stack()
            .stack_name(stack_name)
            .send()
            .await
            .map_err(|e| api_error(SERVICE, "DeleteStack", &e))?;
        Ok(())
    }

    async fn create_change_set(&self, request: &ChangeSetRequest) -> ApiResult<String> {
        let change_set_type = match request.change_set_type {
            ChangeSetType::Create => types::ChangeSetType::Create,
            ChangeSetType::Update => types::ChangeSetType::Update,
        };
        let builder = self
            .client
            .create_change_set()
            .stack_name(&request.stack.stack_name)
            .change_set_name(&request.change_set_name)
            .change_set_type(change_set_type)
            .set_description(request.description.clone())
            .set_parameters(Some(parameters(&request.stack)))
            .set_capabilities(Some(capabilities(&request.stack)));
        let builder = match &request.stack.template {
            TemplateSource::Body(body) => builder.template_body(body),
            TemplateSource::Url(url) => builder.template_url(url),
        };
        let output = builder
            .send()
            .await
            .map_err(|e| api_error(SERVICE, "CreateChangeSet", &e))?;
        Ok(output.id().unwrap_or(&request.change_set_name).to_string())
    }

    async fn execute_change_set(&self, stack_name: &str, change_set_name: &str) -> ApiResult<()> {
        self.client
            .execute_change_set()
            .stack_name(stack_name)
            .change_set_name(change_set_name)
            .send()
            .await
            .map_err(|e| api_error(SERVICE, "ExecuteChangeSet", &e))?;
        Ok(())
    }

    async fn describe_stack(&self, stack_name: &str) -> ApiResult<StatusSnapshot> {
        let output = self
            .client
            .describe_stacks()
            .stack_name(stack_name)
            .send()
            .await
            .map_err(|e| missing_stack(api_error(SERVICE, "DescribeStacks", &e)))?;

        let stack = output.stacks().first().ok_or_else(|| {
            ApiError::not_found(
                SERVICE,
                "DescribeStacks",
                format!("Stack with id {stack_name} does not exist"),
            )
        })?;
        let snapshot = StatusSnapshot::new(stack.stack_status().map_or("UNKNOWN", |s| s.as_str()));
        Ok(match stack.stack_status_reason() {
            Some(reason) => snapshot.with_reason(reason),
            None => snapshot,
        })
    }

    async fn describe_change_set(
        &self,
        stack_name: &str,
        change_set_name: &str,
    ) -> ApiResult<StatusSnapshot> {
        let output = self
            .client
            .describe_change_set()
            .stack_name(stack_name)
            .change_set_name(change_set_name)
            .send()
            .await
            .map_err(|e| {
                let err = api_error(SERVICE, "DescribeChangeSet", &e);
                let not_found = err.code().starts_with("ChangeSetNotFound");
                err.with_not_found(not_found)
            })?;

        let snapshot = StatusSnapshot::new(output.status().map_or("UNKNOWN", |s| s.as_str()));
        Ok(match output.status_reason() {
            Some(reason) => snapshot.with_reason(reason),
            None => snapshot,
        })
    }

    async fn stack_events(
        &self,
        stack_name: &str,
        since: Option<DateTime<Utc>>,
    ) -> ApiResult<Vec<EventRecord>> {
        let mut pages = self
            .client
            .describe_stack_events()
            .stack_name(stack_name)
            .into_paginator()
            .send();
        let mut collected = EventPages::since(since);
        while let Some(page) = pages.next().await {
            let page =
                page.map_err(|e| missing_stack(api_error(SERVICE, "DescribeStackEvents", &e)))?;
            if !collected.push(page.stack_events().iter().filter_map(stack_event)) {
                break;
            }
        }
        Ok(collected.into_events())
    }

    async fn stack_has_resources(&self, stack_name: &str) -> ApiResult<bool> {
        let output = self
            .client
            .describe_stack_resources()
            .stack_name(stack_name)
            .send()
            .await
            .map_err(|e| missing_stack(api_error(SERVICE, "DescribeStackResources", &e)))?;
        Ok(!output.stack_resources().is_empty())
    }
}
