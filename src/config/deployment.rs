//! Deployment identity.

use serde::Serialize;

use crate::error::ConfigError;

/// Identifies one deployment of a pack.
///
/// Every field is required and fixed once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DeploymentConfig {
    deployment_name: String,
    pack_name: String,
    pack_path: String,
    pack_version: String,
    registry_name: String,
}

impl DeploymentConfig {
    /// Creates a deployment config.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] if any field is empty.
    pub fn new(
        deployment_name: impl Into<String>,
        pack_name: impl Into<String>,
        pack_path: impl Into<String>,
        pack_version: impl Into<String>,
        registry_name: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            deployment_name: deployment_name.into(),
            pack_name: pack_name.into(),
            pack_path: pack_path.into(),
            pack_version: pack_version.into(),
            registry_name: registry_name.into(),
        };

        for (field, value) in [
            ("deployment_name", &config.deployment_name),
            ("pack_name", &config.pack_name),
            ("pack_path", &config.pack_path),
            ("pack_version", &config.pack_version),
            ("registry_name", &config.registry_name),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::MissingField { field });
            }
        }

        Ok(config)
    }

    /// Logical deployment name.
    #[must_use]
    pub fn deployment_name(&self) -> &str {
        &self.deployment_name
    }

    /// Pack name.
    #[must_use]
    pub fn pack_name(&self) -> &str {
        &self.pack_name
    }

    /// Path the pack was loaded from.
    #[must_use]
    pub fn pack_path(&self) -> &str {
        &self.pack_path
    }

    /// Pack version.
    #[must_use]
    pub fn pack_version(&self) -> &str {
        &self.pack_version
    }

    /// Registry the pack came from.
    #[must_use]
    pub fn registry_name(&self) -> &str {
        &self.registry_name
    }
}

impl std::fmt::Display for DeploymentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({}@{} from {})",
            self.deployment_name, self.pack_name, self.pack_version, self.registry_name
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        let config = DeploymentConfig::new("web", "nginx", "./packs/nginx", "1.2.0", "community")
            .expect("valid config");

        assert_eq!(config.deployment_name(), "web");
        assert_eq!(config.pack_name(), "nginx");
        assert_eq!(config.pack_path(), "./packs/nginx");
        assert_eq!(config.pack_version(), "1.2.0");
        assert_eq!(config.registry_name(), "community");
        assert_eq!(config.to_string(), "web (nginx@1.2.0 from community)");
    }

    #[test]
    fn test_empty_field_rejected() {
        let err = DeploymentConfig::new("web", "nginx", "./packs/nginx", " ", "community")
            .expect_err("empty version");
        assert!(matches!(
            err,
            ConfigError::MissingField {
                field: "pack_version"
            }
        ));
    }
}
