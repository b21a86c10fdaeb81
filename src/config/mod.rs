//! Configuration module for the pack deployment driver.
//!
//! This module handles:
//! - The immutable [`DeploymentConfig`] every deployer is bound to
//! - Parsing `pack-deploy.yaml` with `.env` and environment overrides
//! - Validation of the driver configuration

mod deployment;
mod parser;
mod spec;
mod validator;

pub use deployment::DeploymentConfig;
pub use parser::{
    ConfigParser, DEFAULT_CONFIG_FILES, ENV_ADDRESS, ENV_DEPLOYMENT_NAME, ENV_REGISTRY, ENV_TOKEN,
    find_config_file,
};
pub use spec::{ClusterConfig, DeploymentSection, DriverConfig};
pub use validator::{ConfigValidator, ValidationError, ValidationResult};
