//! In-memory service fakes for unit tests

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::api::{
    ApiError, ApiResult, BeanstalkApi, ChangeSetRequest, CloudFormationApi, CodeDeployApi,
    CommandRequest, SsmApi, StackRequest,
};
use crate::infrastructure::aws::EventPages;
use crate::waiter::{EventRecord, StatusSnapshot};

/// Timestamp `secs` seconds into a fixed test day
pub(crate) fn at(secs: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap() + chrono::Duration::seconds(secs)
}

/// Replays scripted responses in order, repeating the last one forever
pub(crate) struct Script<T> {
    items: Mutex<VecDeque<T>>,
}

impl<T: Clone> Script<T> {
    pub(crate) fn new(items: impl IntoIterator<Item = T>) -> Self {
        Self {
            items: Mutex::new(items.into_iter().collect()),
        }
    }

    pub(crate) fn next(&self) -> Option<T> {
        let mut items = self.items.lock().unwrap();
        if items.len() > 1 {
            items.pop_front()
        } else {
            items.front().cloned()
        }
    }
}

pub(crate) fn snapshot(status: &str) -> ApiResult<StatusSnapshot> {
    Ok(StatusSnapshot::new(status))
}

/// Scripted CloudFormation
pub(crate) struct FakeCloudFormation {
    pub(crate) stacks: Script<ApiResult<StatusSnapshot>>,
    pub(crate) change_sets: Script<ApiResult<StatusSnapshot>>,
    pub(crate) events: Script<Vec<EventRecord>>,
    pub(crate) page_size: Option<usize>,
    pub(crate) mutation_error: Option<ApiError>,
    pub(crate) has_resources: ApiResult<bool>,
    pub(crate) calls: Mutex<Vec<String>>,
    pub(crate) event_queries: Mutex<Vec<Option<DateTime<Utc>>>>,
}

impl FakeCloudFormation {
    pub(crate) fn new(stacks: Vec<ApiResult<StatusSnapshot>>) -> Self {
        Self {
            stacks: Script::new(stacks),
            change_sets: Script::new(Vec::new()),
            events: Script::new(vec![Vec::new()]),
            page_size: None,
            mutation_error: None,
            has_resources: Ok(false),
            calls: Mutex::new(Vec::new()),
            event_queries: Mutex::new(Vec::new()),
        }
    }

    /// Serves each event batch in pages of `size`, newest first
    pub(crate) fn with_page_size(mut self, size: usize) -> Self {
        self.page_size = Some(size);
        self
    }

    pub(crate) fn event_queries(&self) -> Vec<Option<DateTime<Utc>>> {
        self.event_queries.lock().unwrap().clone()
    }

    pub(crate) fn with_events(mut self, batches: Vec<Vec<EventRecord>>) -> Self {
        self.events = Script::new(batches);
        self
    }

    pub(crate) fn with_change_sets(mut self, statuses: Vec<ApiResult<StatusSnapshot>>) -> Self {
        self.change_sets = Script::new(statuses);
        self
    }

    pub(crate) fn with_mutation_error(mut self, error: ApiError) -> Self {
        self.mutation_error = Some(error);
        self
    }

    pub(crate) fn with_resources(mut self, has_resources: ApiResult<bool>) -> Self {
        self.has_resources = has_resources;
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    fn mutation(&self) -> ApiResult<()> {
        match &self.mutation_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl CloudFormationApi for FakeCloudFormation {
    async fn create_stack(&self, request: &StackRequest) -> ApiResult<String> {
        self.record(format!("CreateStack {}", request.stack_name));
        self.mutation()?;
        Ok(format!("arn:aws:cloudformation:stack/{}", request.stack_name))
    }

    async fn update_stack(&self, request: &StackRequest) -> ApiResult<String> {
        self.record(format!("UpdateStack {}", request.stack_name));
        self.mutation()?;
        Ok(format!("arn:aws:cloudformation:stack/{}", request.stack_name))
    }

    async fn delete_stack(&self, stack_name: &str) -> ApiResult<()> {
        self.record(format!("DeleteStack {stack_name}"));
        self.mutation()
    }

    async fn create_change_set(&self, request: &ChangeSetRequest) -> ApiResult<String> {
        self.record(format!("CreateChangeSet {}", request.change_set_name));
        self.mutation()?;
        Ok(format!("arn:aws:cloudformation:changeSet/{}", request.change_set_name))
    }

    async fn execute_change_set(&self, _stack_name: &str, change_set_name: &str) -> ApiResult<()> {
        self.record(format!("ExecuteChangeSet {change_set_name}"));
        self.mutation()
    }

    async fn describe_stack(&self, stack_name: &str) -> ApiResult<StatusSnapshot> {
        self.record(format!("DescribeStacks {stack_name}"));
        self.stacks
            .next()
            .unwrap_or_else(|| Err(ApiError::not_found("CloudFormation", "DescribeStacks", "no script")))
    }

    async fn describe_change_set(
        &self,
        _stack_name: &str,
        change_set_name: &str,
    ) -> ApiResult<StatusSnapshot> {
        self.record(format!("DescribeChangeSet {change_set_name}"));
        self.change_sets
            .next()
            .unwrap_or_else(|| Err(ApiError::not_found("CloudFormation", "DescribeChangeSet", "no script")))
    }

    async fn stack_events(
        &self,
        _stack_name: &str,
        since: Option<DateTime<Utc>>,
    ) -> ApiResult<Vec<EventRecord>> {
        self.event_queries.lock().unwrap().push(since);
        let mut batch = self.events.next().unwrap_or_default();
        let Some(size) = self.page_size else {
            return Ok(batch);
        };
        batch.sort_by_key(|e| std::cmp::Reverse(e.timestamp));
        let mut pages = EventPages::since(since);
        for page in batch.chunks(size) {
            if !pages.push(page.iter().cloned()) {
                break;
            }
        }
        Ok(pages.into_events())
    }

    async fn stack_has_resources(&self, stack_name: &str) -> ApiResult<bool> {
        self.record(format!("DescribeStackResources {stack_name}"));
        self.has_resources.clone()
    }
}

/// Scripted Elastic Beanstalk
pub(crate) struct FakeBeanstalk {
    pub(crate) environments: Script<ApiResult<StatusSnapshot>>,
    pub(crate) events: Script<Vec<EventRecord>>,
    pub(crate) prior_events: Vec<EventRecord>,
    pub(crate) calls: Mutex<Vec<String>>,
    pub(crate) event_queries: Mutex<Vec<Option<DateTime<Utc>>>>,
}

impl FakeBeanstalk {
    pub(crate) fn new(
        environments: Vec<ApiResult<StatusSnapshot>>,
        events: Vec<Vec<EventRecord>>,
    ) -> Self {
        Self {
            environments: Script::new(environments),
            events: Script::new(events),
            prior_events: Vec::new(),
            calls: Mutex::new(Vec::new()),
            event_queries: Mutex::new(Vec::new()),
        }
    }

    /// Events the environment already had, served for unbounded queries
    pub(crate) fn with_prior_events(mut self, events: Vec<EventRecord>) -> Self {
        self.prior_events = events;
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn event_queries(&self) -> Vec<Option<DateTime<Utc>>> {
        self.event_queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl BeanstalkApi for FakeBeanstalk {
    async fn update_environment(
        &self,
        _application: &str,
        environment: &str,
        version_label: &str,
    ) -> ApiResult<()> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("UpdateEnvironment {environment} {version_label}"));
        Ok(())
    }

    async fn describe_environment(
        &self,
        _application: &str,
        environment: &str,
    ) -> ApiResult<StatusSnapshot> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("DescribeEnvironments {environment}"));
        self.environments
            .next()
            .unwrap_or_else(|| Err(ApiError::not_found("ElasticBeanstalk", "DescribeEnvironments", "no script")))
    }

    async fn describe_events(
        &self,
        _application: &str,
        _environment: &str,
        since: Option<DateTime<Utc>>,
    ) -> ApiResult<Vec<EventRecord>> {
        self.event_queries.lock().unwrap().push(since);
        match since {
            None => Ok(self.prior_events.clone()),
            Some(_) => Ok(self.events.next().unwrap_or_default()),
        }
    }
}

/// Scripted CodeDeploy
pub(crate) struct FakeCodeDeploy {
    pub(crate) deployments: Script<ApiResult<StatusSnapshot>>,
}

impl FakeCodeDeploy {
    pub(crate) fn new(deployments: Vec<ApiResult<StatusSnapshot>>) -> Self {
        Self {
            deployments: Script::new(deployments),
        }
    }
}

#[async_trait]
impl CodeDeployApi for FakeCodeDeploy {
    async fn get_deployment(&self, _deployment_id: &str) -> ApiResult<StatusSnapshot> {
        self.deployments
            .next()
            .unwrap_or_else(|| Err(ApiError::not_found("CodeDeploy", "GetDeployment", "no script")))
    }
}

/// Records sent commands
#[derive(Default)]
pub(crate) struct FakeSsm {
    pub(crate) sent: Mutex<Vec<CommandRequest>>,
}

#[async_trait]
impl SsmApi for FakeSsm {
    async fn send_command(&self, request: &CommandRequest) -> ApiResult<String> {
        let mut sent = self.sent.lock().unwrap();
        sent.push(request.clone());
        Ok(format!("command-{}", sent.len()))
    }
}
