//! aws-pipeline-tasks - AWS deployment steps for CI/CD pipelines
//!
//! Each subcommand performs one deployment operation and blocks until AWS
//! reports a terminal state, streaming service events to the log.
//!
//! ## Quick Start
//!
//! ```bash
//! # Create a stack from a local template
//! aws-pipeline-tasks stack create --stack-name web --template-file web.yaml -p Env=prod
//!
//! # Deploy an application version to Elastic Beanstalk
//! aws-pipeline-tasks beanstalk deploy --application shop --environment shop-prod --version-label v42
//!
//! # Generate shell completions
//! aws-pipeline-tasks completions bash > /etc/bash_completion.d/aws-pipeline-tasks
//! ```
//!
//! Ctrl-C stops the wait in progress; the AWS operation itself keeps running.

use std::process::ExitCode;
use tokio_util::sync::CancellationToken;

mod cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cancel = CancellationToken::new();

    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, cancelling wait");
            on_interrupt.cancel();
        }
    });

    match cli::run(cancel).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            if std::env::var("AWS_PIPELINE_TASKS_VERBOSE").is_ok() {
                eprintln!("{e:?}");
            }
            ExitCode::FAILURE
        }
    }
}
