//! Command-line interface for aws-pipeline-tasks
//!
//! One subcommand per pipeline task:
//! - `stack create|update|delete`: CloudFormation stack lifecycle
//! - `change-set create|execute`: CloudFormation change sets
//! - `beanstalk deploy`: switch an environment to an application version
//! - `codedeploy wait`: wait for a deployment started elsewhere
//! - `ssm send-command`: run a document on instances (no wait)
//! - `completions`: generate shell completions

pub mod completions;

use anyhow::{Context, Result};
use clap::{ArgAction, Args, CommandFactory, Parser, Subcommand, ValueEnum};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use aws_config::SdkConfig;
use tokio_util::sync::CancellationToken;

use aws_pipeline_tasks::api::{ChangeSetRequest, ChangeSetType, CommandRequest, StackRequest, TemplateSource};
use aws_pipeline_tasks::infrastructure::{
    BeanstalkClient, CloudFormationClient, CodeDeployClient, Config, SsmClient, WaiterSettings,
    effective_level, init_logging, load_sdk_config,
};
use aws_pipeline_tasks::operations::WaitContext;
use aws_pipeline_tasks::tasks::{
    BeanstalkTasks, CloudFormationTasks, CodeDeployTasks, SsmTasks, TaskOutcome,
};

/// CLI arguments for aws-pipeline-tasks
#[derive(Parser, Debug)]
#[command(name = "aws-pipeline-tasks")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// YAML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// AWS region (overrides config and environment)
    #[arg(long, global = true)]
    region: Option<String>,

    /// AWS shared-config profile
    #[arg(long, global = true)]
    profile: Option<String>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Result format printed on success
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(flatten)]
    Task(TaskCommand),

    /// Generate shell completions
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: ShellArg,
        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum TaskCommand {
    /// CloudFormation stack operations
    Stack {
        #[command(subcommand)]
        action: StackCommand,
    },

    /// CloudFormation change set operations
    ChangeSet {
        #[command(subcommand)]
        action: ChangeSetCommand,
    },

    /// Elastic Beanstalk deployments
    Beanstalk {
        #[command(subcommand)]
        action: BeanstalkCommand,
    },

    /// CodeDeploy deployments
    Codedeploy {
        #[command(subcommand)]
        action: CodeDeployCommand,
    },

    /// Systems Manager commands
    Ssm {
        #[command(subcommand)]
        action: SsmCommand,
    },
}

#[derive(Subcommand, Debug)]
enum StackCommand {
    /// Create a stack and wait for CREATE_COMPLETE
    Create {
        #[command(flatten)]
        stack: StackArgs,
        #[command(flatten)]
        wait: WaitArgs,
    },
    /// Update a stack and wait for UPDATE_COMPLETE
    Update {
        #[command(flatten)]
        stack: StackArgs,
        #[command(flatten)]
        wait: WaitArgs,
    },
    /// Delete a stack and wait until it is gone
    Delete {
        /// Stack name
        #[arg(long)]
        stack_name: String,
        #[command(flatten)]
        wait: WaitArgs,
    },
}

#[derive(Subcommand, Debug)]
enum ChangeSetCommand {
    /// Create a change set and wait until it can be executed
    Create {
        #[command(flatten)]
        stack: StackArgs,
        /// Change set name
        #[arg(long)]
        change_set_name: String,
        /// The stack already exists
        #[arg(long)]
        update: bool,
        /// Change set description
        #[arg(long)]
        description: Option<String>,
        #[command(flatten)]
        wait: WaitArgs,
    },
    /// Execute a change set and wait for the stack
    Execute {
        /// Stack name
        #[arg(long)]
        stack_name: String,
        /// Change set name
        #[arg(long)]
        change_set_name: String,
        #[command(flatten)]
        wait: WaitArgs,
    },
}

#[derive(Subcommand, Debug)]
enum BeanstalkCommand {
    /// Deploy an existing application version and wait for the environment
    Deploy {
        /// Application name
        #[arg(long)]
        application: String,
        /// Environment name
        #[arg(long)]
        environment: String,
        /// Application version label
        #[arg(long)]
        version_label: String,
        #[command(flatten)]
        wait: WaitArgs,
    },
}

#[derive(Subcommand, Debug)]
enum CodeDeployCommand {
    /// Wait for a deployment to succeed
    Wait {
        /// Deployment id, e.g. d-ABC123
        #[arg(long)]
        deployment_id: String,
        #[command(flatten)]
        wait: WaitArgs,
    },
}

#[derive(Subcommand, Debug)]
enum SsmCommand {
    /// Send a command and print its id
    SendCommand {
        /// SSM document name
        #[arg(long)]
        document_name: String,
        /// Target instance (repeatable)
        #[arg(long = "instance-id", required = true)]
        instance_ids: Vec<String>,
        /// Document parameter as Key=Value (repeatable)
        #[arg(long = "parameter", short = 'p', value_parser = parse_key_value)]
        parameters: Vec<(String, String)>,
        /// Comment shown in the console
        #[arg(long)]
        comment: Option<String>,
        /// Seconds the command may wait to start
        #[arg(long)]
        timeout_seconds: Option<i32>,
    },
}

/// Stack name, template and inputs
#[derive(Args, Debug)]
struct StackArgs {
    /// Stack name
    #[arg(long)]
    stack_name: String,
    /// Local template file
    #[arg(long, conflicts_with = "template_url", required_unless_present = "template_url")]
    template_file: Option<PathBuf>,
    /// S3 template URL
    #[arg(long)]
    template_url: Option<String>,
    /// Template parameter as Key=Value (repeatable)
    #[arg(long = "parameter", short = 'p', value_parser = parse_key_value)]
    parameters: Vec<(String, String)>,
    /// Capability such as CAPABILITY_IAM (repeatable)
    #[arg(long = "capability")]
    capabilities: Vec<String>,
}

/// Per-invocation waiter overrides
#[derive(Args, Debug, Default)]
struct WaitArgs {
    /// Give up after this many minutes
    #[arg(long)]
    timeout_minutes: Option<u64>,
    /// Seconds between status checks
    #[arg(long)]
    interval_secs: Option<u64>,
}

impl WaitArgs {
    fn apply(&self, base: WaiterSettings) -> WaiterSettings {
        WaiterSettings {
            interval_secs: self.interval_secs.unwrap_or(base.interval_secs),
            timeout_minutes: self.timeout_minutes.or(base.timeout_minutes),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum ShellArg {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected Key=Value, got '{s}'"))?;
    if key.is_empty() {
        return Err(format!("missing key in '{s}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

fn stack_request(args: StackArgs) -> Result<StackRequest> {
    let template = match (args.template_file, args.template_url) {
        (Some(path), _) => TemplateSource::Body(read_template(&path)?),
        (None, Some(url)) => TemplateSource::Url(url),
        (None, None) => anyhow::bail!("Either --template-file or --template-url is required"),
    };
    Ok(StackRequest {
        stack_name: args.stack_name,
        template,
        parameters: args.parameters,
        capabilities: args.capabilities,
    })
}

fn read_template(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read template: {}", path.display()))
}

fn command_parameters(pairs: Vec<(String, String)>) -> BTreeMap<String, Vec<String>> {
    let mut parameters: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (key, value) in pairs {
        parameters.entry(key).or_default().push(value);
    }
    parameters
}

/// Build the CLI command for completion generation
pub fn build_cli() -> clap::Command {
    Cli::command()
}

/// Parse and execute CLI arguments
///
/// `cancel` stops any wait in progress.
pub async fn run(cancel: CancellationToken) -> Result<()> {
    let cli = Cli::parse();

    let task = match cli.command {
        Command::Completions { shell, output } => {
            return write_completions(shell, output.as_deref());
        }
        Command::Task(task) => task,
    };

    let config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => Config::default(),
    };
    init_logging(&effective_level(&config.log_level, cli.verbose, cli.quiet));

    let region = cli.region.as_deref().or(config.region.as_deref());
    let profile = cli.profile.as_deref().or(config.profile.as_deref());
    let sdk = load_sdk_config(region, profile).await;

    let outcome = execute(task, &config, &sdk, WaitContext::new(cancel)).await?;
    println!("{}", report(&outcome, cli.format)?);
    Ok(())
}

fn write_completions(shell: ShellArg, output: Option<&Path>) -> Result<()> {
    let shell = match shell {
        ShellArg::Bash => clap_complete::Shell::Bash,
        ShellArg::Zsh => clap_complete::Shell::Zsh,
        ShellArg::Fish => clap_complete::Shell::Fish,
        ShellArg::PowerShell => clap_complete::Shell::PowerShell,
    };
    let script = completions::generate_completions(shell)?;
    match output {
        Some(path) => completions::save_completions(&script, path),
        None => {
            print!("{script}");
            Ok(())
        }
    }
}

async fn execute(
    task: TaskCommand,
    config: &Config,
    sdk: &SdkConfig,
    context: WaitContext,
) -> Result<TaskOutcome> {
    let outcome = match task {
        TaskCommand::Stack { action } => {
            let client = Arc::new(CloudFormationClient::from_config(sdk));
            match action {
                StackCommand::Create { stack, wait } => {
                    stack_tasks(client, config, context, &wait, None)
                        .create_stack(&stack_request(stack)?)
                        .await?
                }
                StackCommand::Update { stack, wait } => {
                    stack_tasks(client, config, context, &wait, None)
                        .update_stack(&stack_request(stack)?)
                        .await?
                }
                StackCommand::Delete { stack_name, wait } => {
                    stack_tasks(client, config, context, &wait, None)
                        .delete_stack(&stack_name)
                        .await?
                }
            }
        }
        TaskCommand::ChangeSet { action } => {
            let client = Arc::new(CloudFormationClient::from_config(sdk));
            match action {
                ChangeSetCommand::Create {
                    stack,
                    change_set_name,
                    update,
                    description,
                    wait,
                } => {
                    let request = ChangeSetRequest {
                        stack: stack_request(stack)?,
                        change_set_name,
                        change_set_type: if update {
                            ChangeSetType::Update
                        } else {
                            ChangeSetType::Create
                        },
                        description,
                    };
                    stack_tasks(client, config, context, &WaitArgs::default(), Some(&wait))
                        .create_change_set(&request)
                        .await?
                }
                ChangeSetCommand::Execute {
                    stack_name,
                    change_set_name,
                    wait,
                } => {
                    stack_tasks(client, config, context, &wait, None)
                        .execute_change_set(&stack_name, &change_set_name)
                        .await?
                }
            }
        }
        TaskCommand::Beanstalk {
            action:
                BeanstalkCommand::Deploy {
                    application,
                    environment,
                    version_label,
                    wait,
                },
        } => {
            let client = Arc::new(BeanstalkClient::from_config(sdk));
            BeanstalkTasks::new(client, context)
                .with_config(config.poll_config(&wait.apply(config.environment)))
                .deploy_version(&application, &environment, &version_label)
                .await?
        }
        TaskCommand::Codedeploy {
            action: CodeDeployCommand::Wait {
                deployment_id,
                wait,
            },
        } => {
            let client = Arc::new(CodeDeployClient::from_config(sdk));
            CodeDeployTasks::new(client, context)
                .with_config(config.poll_config(&wait.apply(config.deployment)))
                .wait_for_deployment(&deployment_id)
                .await?
        }
        TaskCommand::Ssm {
            action:
                SsmCommand::SendCommand {
                    document_name,
                    instance_ids,
                    parameters,
                    comment,
                    timeout_seconds,
                },
        } => {
            let request = CommandRequest {
                document_name,
                instance_ids,
                parameters: command_parameters(parameters),
                comment,
                timeout_seconds,
            };
            SsmTasks::new(Arc::new(SsmClient::from_config(sdk)))
                .send_command(&request)
                .await?
        }
    };
    Ok(outcome)
}

/// Stack tasks with stack and change set overrides applied
fn stack_tasks(
    client: Arc<CloudFormationClient>,
    config: &Config,
    context: WaitContext,
    stack_wait: &WaitArgs,
    change_set_wait: Option<&WaitArgs>,
) -> CloudFormationTasks {
    let change_set = change_set_wait.map_or(config.change_set, |w| w.apply(config.change_set));
    CloudFormationTasks::new(client, context).with_configs(
        config.poll_config(&stack_wait.apply(config.stack)),
        config.poll_config(&change_set),
    )
}

fn report(outcome: &TaskOutcome, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(outcome.to_string()),
        OutputFormat::Json => {
            serde_json::to_string_pretty(outcome).context("Failed to serialize task outcome")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("Env=prod"),
            Ok(("Env".to_string(), "prod".to_string()))
        );
        assert_eq!(
            parse_key_value("Url=https://x/?a=b"),
            Ok(("Url".to_string(), "https://x/?a=b".to_string()))
        );
        assert!(parse_key_value("novalue").is_err());
        assert!(parse_key_value("=value").is_err());
    }

    #[test]
    fn test_parse_stack_create() {
        let cli = Cli::try_parse_from([
            "aws-pipeline-tasks",
            "stack",
            "create",
            "--stack-name",
            "web",
            "--template-url",
            "https://bucket.s3.amazonaws.com/web.yaml",
            "-p",
            "Env=prod",
            "--capability",
            "CAPABILITY_IAM",
            "--timeout-minutes",
            "30",
        ])
        .unwrap();

        let Command::Task(TaskCommand::Stack {
            action: StackCommand::Create { stack, wait },
        }) = cli.command
        else {
            panic!("unexpected command");
        };
        assert_eq!(stack.parameters, vec![("Env".to_string(), "prod".to_string())]);
        assert_eq!(wait.timeout_minutes, Some(30));

        let request = stack_request(stack).unwrap();
        assert_eq!(
            request.template,
            TemplateSource::Url("https://bucket.s3.amazonaws.com/web.yaml".to_string())
        );
        assert_eq!(request.capabilities, vec!["CAPABILITY_IAM".to_string()]);
    }

    #[test]
    fn test_template_is_required() {
        let result = Cli::try_parse_from(["aws-pipeline-tasks", "stack", "update", "--stack-name", "web"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_template_file_is_read() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"Resources: {}\n").unwrap();
        let args = StackArgs {
            stack_name: "web".to_string(),
            template_file: Some(file.path().to_path_buf()),
            template_url: None,
            parameters: Vec::new(),
            capabilities: Vec::new(),
        };

        let request = stack_request(args).unwrap();

        assert_eq!(request.template, TemplateSource::Body("Resources: {}\n".to_string()));
    }

    #[test]
    fn test_wait_args_override_config() {
        let base = WaiterSettings::new(15, 60);
        let wait = WaitArgs {
            timeout_minutes: Some(5),
            interval_secs: None,
        };
        assert_eq!(wait.apply(base), WaiterSettings::new(15, 5));
        assert_eq!(WaitArgs::default().apply(base), base);
    }

    #[test]
    fn test_command_parameters_group_repeated_keys() {
        let parameters = command_parameters(vec![
            ("commands".to_string(), "cd /srv/app".to_string()),
            ("commands".to_string(), "./restart.sh".to_string()),
            ("workingDirectory".to_string(), "/srv".to_string()),
        ]);
        assert_eq!(parameters["commands"], vec!["cd /srv/app", "./restart.sh"]);
        assert_eq!(parameters["workingDirectory"], vec!["/srv"]);
    }

    #[test]
    fn test_parse_ssm_send_command() {
        let cli = Cli::try_parse_from([
            "aws-pipeline-tasks",
            "ssm",
            "send-command",
            "--document-name",
            "AWS-RunShellScript",
            "--instance-id",
            "i-0123456789abcdef0",
            "-p",
            "commands=uptime",
        ])
        .unwrap();
        assert!(matches!(cli.command, Command::Task(TaskCommand::Ssm { .. })));
    }

    #[test]
    fn test_report_formats() {
        let outcome = TaskOutcome::unchanged("stack 'web'", "UPDATE_COMPLETE");

        assert_eq!(
            report(&outcome, OutputFormat::Text).unwrap(),
            "stack 'web': no changes (UPDATE_COMPLETE)"
        );

        let json: serde_json::Value =
            serde_json::from_str(&report(&outcome, OutputFormat::Json).unwrap()).unwrap();
        assert_eq!(json["resource"], "stack 'web'");
        assert_eq!(json["no_op"], true);
        assert!(json["id"].is_null());
    }

    #[test]
    fn test_parse_completions() {
        let cli = Cli::try_parse_from(["aws-pipeline-tasks", "completions", "bash"]).unwrap();
        match cli.command {
            Command::Completions { shell, output } => {
                assert_eq!(shell, ShellArg::Bash);
                assert_eq!(output, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert_eq!(cli.format, OutputFormat::Text);

        let cli = Cli::try_parse_from([
            "aws-pipeline-tasks",
            "completions",
            "zsh",
            "--output",
            "/tmp/_aws-pipeline-tasks",
        ])
        .unwrap();
        match cli.command {
            Command::Completions { output, .. } => {
                assert_eq!(output, Some(PathBuf::from("/tmp/_aws-pipeline-tasks")));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_json_format() {
        let cli = Cli::try_parse_from([
            "aws-pipeline-tasks",
            "codedeploy",
            "wait",
            "--deployment-id",
            "d-ABC123",
            "--format",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }
}
