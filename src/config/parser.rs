//! Configuration parser for the driver configuration file.
//!
//! This module loads `pack-deploy.yaml`, applies `.env` files and
//! `PACK_DEPLOY_*` environment overrides, and locates the file by searching
//! upward from a directory.

use crate::error::{ConfigError, PackError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::spec::DriverConfig;

/// Environment variable overriding `cluster.address`.
pub const ENV_ADDRESS: &str = "PACK_DEPLOY_ADDRESS";
/// Environment variable holding the cluster API token.
pub const ENV_TOKEN: &str = "PACK_DEPLOY_TOKEN";
/// Environment variable overriding `deployment.name`.
pub const ENV_DEPLOYMENT_NAME: &str = "PACK_DEPLOY_DEPLOYMENT_NAME";
/// Environment variable overriding `deployment.registry`.
pub const ENV_REGISTRY: &str = "PACK_DEPLOY_REGISTRY";

/// Configuration parser for loading the driver configuration.
#[derive(Debug, Default)]
pub struct ConfigParser {
    /// Base path for `.env` and relative template directories.
    base_path: Option<PathBuf>,
}

impl ConfigParser {
    /// Creates a new configuration parser.
    #[must_use]
    pub const fn new() -> Self {
        Self { base_path: None }
    }

    /// Sets the base path for resolving relative paths.
    #[must_use]
    pub fn with_base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    /// Loads configuration from a YAML file.
    ///
    /// A relative `templates` directory is resolved against the base path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<DriverConfig> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());

        if !path.exists() {
            return Err(PackError::Config(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            }));
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            PackError::Config(ConfigError::ParseError {
                message: format!("Failed to read file: {e}"),
                location: Some(path.display().to_string()),
            })
        })?;

        let mut config = self.parse_yaml(&content, Some(path))?;
        if let Some(base) = &self.base_path
            && config.templates.is_relative()
        {
            config.templates = base.join(&config.templates);
        }
        Ok(config)
    }

    /// Parses configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid.
    pub fn parse_yaml(&self, content: &str, source: Option<&Path>) -> Result<DriverConfig> {
        debug!("Parsing YAML configuration");

        let config: DriverConfig = serde_yaml::from_str(content).map_err(|e| {
            let location = source.map(|p| p.display().to_string());
            PackError::Config(ConfigError::ParseError {
                message: format!("YAML parse error: {e}"),
                location,
            })
        })?;

        debug!("Parsed configuration for deployment: {}", config.deployment.name);
        Ok(config)
    }

    /// Loads configuration with `PACK_DEPLOY_*` environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_with_env(&self, path: impl AsRef<Path>) -> Result<DriverConfig> {
        let mut config = self.load_file(path)?;
        Self::apply_env_overrides(&mut config, |name| std::env::var(name).ok());
        Ok(config)
    }

    /// Applies overrides read through `lookup`.
    pub fn apply_env_overrides(config: &mut DriverConfig, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(address) = lookup(ENV_ADDRESS) {
            debug!("Overriding cluster.address from environment");
            config.cluster.address = address;
        }

        if let Some(name) = lookup(ENV_DEPLOYMENT_NAME) {
            debug!("Overriding deployment.name from environment");
            config.deployment.name = name;
        }

        if let Some(registry) = lookup(ENV_REGISTRY) {
            debug!("Overriding deployment.registry from environment");
            config.deployment.registry = registry;
        }
    }

    /// Loads the .env file if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the .env file exists but cannot be loaded.
    pub fn load_dotenv(&self) -> Result<()> {
        let env_path = self
            .base_path
            .as_ref()
            .map_or_else(|| PathBuf::from(".env"), |p| p.join(".env"));

        if env_path.exists() {
            info!("Loading environment from: {}", env_path.display());
            dotenvy::from_path(&env_path).map_err(|e| {
                PackError::Config(ConfigError::ParseError {
                    message: format!("Failed to load .env file: {e}"),
                    location: Some(env_path.display().to_string()),
                })
            })?;
        } else {
            debug!(".env file not found at: {}", env_path.display());
        }

        Ok(())
    }

    /// Gets the cluster API token from the environment, if set.
    #[must_use]
    pub fn cluster_token() -> Option<String> {
        std::env::var(ENV_TOKEN).ok().filter(|t| !t.is_empty())
    }
}

/// Default configuration file names to search for.
pub const DEFAULT_CONFIG_FILES: &[&str] = &["pack-deploy.yaml", "pack-deploy.yml"];

/// Finds the configuration file in the given directory or its parents.
///
/// # Errors
///
/// Returns an error if no configuration file is found.
pub fn find_config_file(start_dir: impl AsRef<Path>) -> Result<PathBuf> {
    let start = start_dir.as_ref();
    let mut current = start.to_path_buf();

    loop {
        for filename in DEFAULT_CONFIG_FILES {
            let config_path = current.join(filename);
            if config_path.exists() {
                info!("Found configuration file: {}", config_path.display());
                return Ok(config_path);
            }
        }

        if !current.pop() {
            break;
        }
    }

    Err(PackError::Config(ConfigError::FileNotFound {
        path: start.join(DEFAULT_CONFIG_FILES[0]),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const CONFIG: &str = r"
cluster:
  address: http://10.0.0.5:4646
  region: eu
deployment:
  name: web
  pack: nginx
  path: ./packs/nginx
  version: 1.2.0
  registry: community
templates: out
";

    #[test]
    fn test_parse_config() {
        let config = ConfigParser::new().parse_yaml(CONFIG, None).expect("parse");

        assert_eq!(config.cluster.address, "http://10.0.0.5:4646");
        assert_eq!(config.cluster.region.as_deref(), Some("eu"));
        assert_eq!(config.deployment.pack, "nginx");
        assert_eq!(config.templates, PathBuf::from("out"));
    }

    #[test]
    fn test_missing_deployment_is_parse_error() {
        let err = ConfigParser::new()
            .parse_yaml("cluster:\n  address: http://x\n", None)
            .expect_err("no deployment section");
        assert!(matches!(err, PackError::Config(ConfigError::ParseError { .. })));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = ConfigParser::new().parse_yaml(CONFIG, None).expect("parse");
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_ADDRESS, "https://cluster.internal"),
            (ENV_DEPLOYMENT_NAME, "web-canary"),
        ]);

        ConfigParser::apply_env_overrides(&mut config, |name| env.get(name).map(ToString::to_string));

        assert_eq!(config.cluster.address, "https://cluster.internal");
        assert_eq!(config.deployment.name, "web-canary");
        assert_eq!(config.deployment.registry, "community");
    }

    #[test]
    fn test_load_file_resolves_templates_and_finds_upward() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("pack-deploy.yaml");
        std::fs::write(&path, CONFIG).expect("write config");
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).expect("mkdir");

        let found = find_config_file(&nested).expect("found");
        assert_eq!(found, path);

        let config = ConfigParser::new()
            .with_base_path(dir.path())
            .load_file(&found)
            .expect("load");
        assert_eq!(config.templates, dir.path().join("out"));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = ConfigParser::new()
            .load_file(dir.path().join("missing.yaml"))
            .expect_err("missing");
        assert!(matches!(err, PackError::Config(ConfigError::FileNotFound { .. })));
    }
}
