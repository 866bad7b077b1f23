//! SSM run-command task
//!
//! Fire-and-forget: the command id is reported and the pipeline moves on.

use std::sync::Arc;
use tracing::info;

use super::{TaskError, TaskOutcome};
use crate::api::{CommandRequest, SsmApi};
use crate::waiter::Validate;

/// Status reported for a command that has been accepted
const COMMAND_SENT: &str = "Pending";

/// Sends commands through Systems Manager
pub struct SsmTasks {
    api: Arc<dyn SsmApi>,
}

impl SsmTasks {
    /// Creates the task
    pub fn new(api: Arc<dyn SsmApi>) -> Self {
        Self { api }
    }

    /// Sends the command and returns its id without waiting for it to run
    ///
    /// # Errors
    ///
    /// Fails on invalid input or a rejected call.
    pub async fn send_command(&self, request: &CommandRequest) -> Result<TaskOutcome, TaskError> {
        request.validate()?;
        let command_id = self.api.send_command(request).await?;
        info!(
            document = %request.document_name,
            command_id = %command_id,
            targets = request.instance_ids.len(),
            "Command sent"
        );
        Ok(TaskOutcome {
            resource: format!("command '{}'", request.document_name),
            status: COMMAND_SENT.to_string(),
            no_op: false,
            id: Some(command_id),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeSsm;

    #[tokio::test]
    async fn test_send_command_returns_id() {
        let api = Arc::new(FakeSsm::default());
        let tasks = SsmTasks::new(Arc::clone(&api) as Arc<dyn SsmApi>);
        let request = CommandRequest {
            document_name: "AWS-RunShellScript".to_string(),
            instance_ids: vec!["i-0123456789abcdef0".to_string()],
            parameters: [("commands".to_string(), vec!["systemctl restart app".to_string()])]
                .into_iter()
                .collect(),
            ..Default::default()
        };

        let outcome = tasks.send_command(&request).await.unwrap();

        assert_eq!(outcome.id.as_deref(), Some("command-1"));
        assert_eq!(outcome.status, "Pending");
        assert_eq!(api.sent.lock().unwrap()[0], request);
    }
}
