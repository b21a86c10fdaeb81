//! Driver configuration types.
//!
//! These structs map to `pack-deploy.yaml`: where the cluster is, which
//! deployment to run, and where the rendered templates live.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::cluster::DEFAULT_TIMEOUT_SECS;
use crate::error::ConfigError;

use super::deployment::DeploymentConfig;

/// Root of the driver configuration file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DriverConfig {
    /// Cluster connection settings.
    #[serde(default)]
    pub cluster: ClusterConfig,
    /// The deployment to run.
    pub deployment: DeploymentSection,
    /// Directory holding the rendered templates.
    #[serde(default = "default_templates_dir")]
    pub templates: PathBuf,
}

/// Cluster connection settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClusterConfig {
    /// Base URL of the cluster API.
    #[serde(default = "default_address")]
    pub address: String,
    /// Region to target.
    #[serde(default)]
    pub region: Option<String>,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

/// Deployment identity as written in the file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeploymentSection {
    /// Deployment name.
    pub name: String,
    /// Pack name.
    pub pack: String,
    /// Pack path.
    pub path: String,
    /// Pack version.
    pub version: String,
    /// Registry the pack came from.
    pub registry: String,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            region: None,
            timeout_secs: default_timeout(),
        }
    }
}

impl DriverConfig {
    /// Builds the immutable deployment config.
    ///
    /// # Errors
    ///
    /// Returns an error if a deployment field is empty.
    pub fn deployment_config(&self) -> Result<DeploymentConfig, ConfigError> {
        let d = &self.deployment;
        DeploymentConfig::new(
            d.name.as_str(),
            d.pack.as_str(),
            d.path.as_str(),
            d.version.as_str(),
            d.registry.as_str(),
        )
    }
}

fn default_address() -> String {
    String::from("http://127.0.0.1:4646")
}

const fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_templates_dir() -> PathBuf {
    PathBuf::from("rendered")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_applied() {
        let config: DriverConfig = serde_yaml::from_str(
            "deployment:\n  name: web\n  pack: nginx\n  path: ./packs/nginx\n  version: 1.2.0\n  registry: community\n",
        )
        .expect("parse");

        assert_eq!(config.cluster.address, "http://127.0.0.1:4646");
        assert_eq!(config.cluster.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.templates, PathBuf::from("rendered"));
        assert_eq!(
            config.deployment_config().expect("identity").to_string(),
            "web (nginx@1.2.0 from community)"
        );
    }
}
