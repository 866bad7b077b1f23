//! Infrastructure layer
//!
//! SDK-backed service clients, configuration loading and logging setup.

pub(crate) mod aws;
mod beanstalk;
mod cloudformation;
mod codedeploy;
mod config;
mod logging;
mod ssm;

pub use aws::load_sdk_config;
pub use beanstalk::BeanstalkClient;
pub use cloudformation::CloudFormationClient;
pub use codedeploy::CodeDeployClient;
pub use config::{Config, ConfigError, WaiterSettings};
pub use logging::{effective_level, init_logging};
pub use ssm::SsmClient;
