//! Validation of the driver configuration.
//!
//! Every problem is collected so a broken file can be fixed in one pass.

use crate::error::{ConfigError, PackError, Result};
use tracing::debug;

use super::spec::{ClusterConfig, DeploymentSection, DriverConfig};

/// Largest accepted request timeout.
const MAX_TIMEOUT_SECS: u64 = 600;

/// Validator for driver configurations.
#[derive(Debug, Default)]
pub struct ConfigValidator;

/// Validation result containing all errors found.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// List of validation errors.
    pub errors: Vec<ValidationError>,
    /// List of warnings (non-fatal issues).
    pub warnings: Vec<String>,
}

/// A single validation error.
#[derive(Debug)]
pub struct ValidationError {
    /// The field path that failed validation.
    pub field: String,
    /// The error message.
    pub message: String,
}

impl ConfigValidator {
    /// Creates a new validator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Validates a driver configuration.
    ///
    /// # Errors
    ///
    /// Returns the first error if validation fails.
    pub fn validate(&self, config: &DriverConfig) -> Result<ValidationResult> {
        let result = self.check(config);

        if result.errors.is_empty() {
            debug!("Configuration validation passed");
            Ok(result)
        } else {
            let first_error = &result.errors[0];
            Err(PackError::Config(ConfigError::ValidationError {
                message: first_error.message.clone(),
                field: Some(first_error.field.clone()),
            }))
        }
    }

    /// Collects every error and warning without failing.
    #[must_use]
    pub fn check(&self, config: &DriverConfig) -> ValidationResult {
        let mut result = ValidationResult::default();
        Self::validate_cluster(&config.cluster, &mut result);
        Self::validate_deployment(&config.deployment, &mut result);
        if config.templates.as_os_str().is_empty() {
            result.push("templates", "Templates directory cannot be empty");
        }
        result
    }

    fn validate_cluster(cluster: &ClusterConfig, result: &mut ValidationResult) {
        let address = cluster.address.trim();
        if address.is_empty() {
            result.push("cluster.address", "Cluster address cannot be empty");
        } else if !(address.starts_with("http://") || address.starts_with("https://")) {
            result.push(
                "cluster.address",
                format!("Cluster address '{address}' must start with http:// or https://"),
            );
        } else if address.starts_with("http://")
            && !address.contains("127.0.0.1")
            && !address.contains("localhost")
        {
            result
                .warnings
                .push(format!("Cluster address '{address}' is not using TLS"));
        }

        if cluster.timeout_secs == 0 || cluster.timeout_secs > MAX_TIMEOUT_SECS {
            result.push(
                "cluster.timeout_secs",
                format!(
                    "Timeout {} is outside 1..={MAX_TIMEOUT_SECS} seconds",
                    cluster.timeout_secs
                ),
            );
        }
    }

    fn validate_deployment(deployment: &DeploymentSection, result: &mut ValidationResult) {
        for (field, value) in [
            ("deployment.name", &deployment.name),
            ("deployment.pack", &deployment.pack),
            ("deployment.path", &deployment.path),
            ("deployment.version", &deployment.version),
            ("deployment.registry", &deployment.registry),
        ] {
            if value.trim().is_empty() {
                result.push(field, format!("{field} cannot be empty"));
            }
        }

        if !deployment.name.is_empty() && !is_valid_name(&deployment.name) {
            result.push(
                "deployment.name",
                format!(
                    "Deployment name '{}' is invalid. Must be lowercase alphanumeric with hyphens.",
                    deployment.name
                ),
            );
        }
    }
}

/// Checks that a name is lowercase alphanumerics and hyphens, starting with
/// a letter.
fn is_valid_name(name: &str) -> bool {
    let Some(first) = name.chars().next() else {
        return false;
    };

    // Must start with a letter
    if !first.is_ascii_lowercase() {
        return false;
    }

    // Only lowercase letters, digits and hyphens
    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return false;
    }

    !name.ends_with('-') && !name.contains("--")
}

impl ValidationResult {
    fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Returns true if validation passed (no errors).
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the number of errors.
    #[must_use]
    pub const fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Returns the number of warnings.
    #[must_use]
    pub const fn warning_count(&self) -> usize {
        self.warnings.len()
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn config() -> DriverConfig {
        DriverConfig {
            cluster: ClusterConfig::default(),
            deployment: DeploymentSection {
                name: String::from("web"),
                pack: String::from("nginx"),
                path: String::from("./packs/nginx"),
                version: String::from("1.2.0"),
                registry: String::from("community"),
            },
            templates: PathBuf::from("rendered"),
        }
    }

    #[test]
    fn test_valid_config() {
        let result = ConfigValidator::new().validate(&config()).expect("valid");
        assert!(result.is_valid());
        assert_eq!(result.warning_count(), 0);
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = config();
        config.cluster.address = String::from("ftp://cluster");
        config.cluster.timeout_secs = 0;
        config.deployment.pack = String::new();
        config.deployment.name = String::from("Web_1");

        let result = ConfigValidator::new().check(&config);
        let fields: Vec<String> = result.errors.iter().map(|e| e.field.clone()).collect();
        assert_eq!(
            fields,
            vec![
                "cluster.address",
                "cluster.timeout_secs",
                "deployment.pack",
                "deployment.name",
            ]
        );

        let err = ConfigValidator::new().validate(&config).expect_err("invalid");
        assert!(err.to_string().contains("ftp://cluster"));
    }

    #[test]
    fn test_plain_http_remote_warns() {
        let mut config = config();
        config.cluster.address = String::from("http://cluster.example.com:4646");

        let result = ConfigValidator::new().check(&config);
        assert!(result.is_valid());
        assert_eq!(result.warning_count(), 1);
    }

    #[test]
    fn test_valid_name() {
        assert!(is_valid_name("web"));
        assert!(is_valid_name("web-canary-2"));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("Web"));
        assert!(!is_valid_name("2web"));
        assert!(!is_valid_name("web_canary"));
        assert!(!is_valid_name("web-"));
        assert!(!is_valid_name("web--canary"));
    }
}
