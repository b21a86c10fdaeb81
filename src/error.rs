//! Error types for the pack deployment pipeline.
//!
//! This module provides the error hierarchy for every concern the
//! pipeline touches: driver configuration, rendered templates, the
//! cluster API, and the deployer lifecycle itself.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for the pack deployment pipeline.
#[derive(Debug, Error)]
pub enum PackError {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Template parse and canonicalization errors.
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    /// Cluster API errors.
    #[error("Cluster API error: {0}")]
    Cluster(#[from] ClusterError),

    /// Deployer lifecycle errors.
    #[error("Deployment error: {0}")]
    Deploy(#[from] DeployError),

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file was not found.
    #[error("Configuration file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// The configuration file could not be parsed.
    #[error("Failed to parse configuration: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// Optional source location.
        location: Option<String>,
    },

    /// Validation failed.
    #[error("Configuration validation failed: {message}")]
    ValidationError {
        /// Description of the validation error.
        message: String,
        /// Field that failed validation.
        field: Option<String>,
    },

    /// A required deployment identity field was empty.
    #[error("Deployment config field '{field}' must not be empty")]
    MissingField {
        /// Name of the empty field.
        field: &'static str,
    },

    /// Environment variable is missing.
    #[error("Missing environment variable: {name}")]
    MissingEnvVar {
        /// Name of the missing variable.
        name: String,
    },

    /// The rendered templates directory does not exist or holds no templates.
    #[error("No rendered templates found in {path}")]
    TemplatesNotFound {
        /// Directory that was searched.
        path: PathBuf,
    },
}

/// Errors raised while decoding or normalizing a rendered template.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// The template text does not decode into an object.
    #[error("failed to parse template: {message}")]
    Parse {
        /// Decoder message.
        message: String,
    },

    /// The template decoded but describes an invalid object.
    #[error("invalid {field}: {message}")]
    Invalid {
        /// Field path that failed validation.
        field: String,
        /// Description of the problem.
        message: String,
    },
}

/// Cluster API errors.
#[derive(Debug, Clone, Error)]
pub enum ClusterError {
    /// Authentication failed.
    #[error("cluster authentication failed: {message}")]
    AuthenticationFailed {
        /// Description of the auth failure.
        message: String,
    },

    /// API request failed.
    #[error("cluster API request failed: {status} - {message}")]
    ApiRequestFailed {
        /// HTTP status code.
        status: u16,
        /// Error message from the API.
        message: String,
    },

    /// Rate limited.
    #[error("cluster API rate limited, retry after {retry_after_secs} seconds")]
    RateLimited {
        /// Seconds to wait before retrying.
        retry_after_secs: u64,
    },

    /// Object not found.
    #[error("{kind} not found: {name}")]
    NotFound {
        /// Object kind.
        kind: String,
        /// Object name.
        name: String,
    },

    /// Network error.
    #[error("network error communicating with the cluster: {message}")]
    NetworkError {
        /// Description of the network error.
        message: String,
    },

    /// Invalid response from the API.
    #[error("invalid response from cluster API: {message}")]
    InvalidResponse {
        /// Description of the response issue.
        message: String,
    },
}

/// Deployer lifecycle errors.
#[derive(Debug, Error)]
pub enum DeployError {
    /// A stage was invoked before its prerequisites ran, or after a later stage.
    #[error("cannot {operation} while deployer is {stage}")]
    StageOrder {
        /// Operation that was attempted.
        operation: &'static str,
        /// Stage the deployer was in.
        stage: &'static str,
    },

    /// The deployer was already bound to a different deployment.
    #[error("deployer is already bound to deployment '{deployment}'")]
    AlreadyConfigured {
        /// Deployment name of the existing binding.
        deployment: String,
    },

    /// An object with the same identity exists without pack provenance.
    #[error("{kind} '{name}' already exists and was not deployed by a pack")]
    UnmanagedConflict {
        /// Object kind.
        kind: &'static str,
        /// Object name.
        name: String,
    },

    /// An object with the same identity belongs to another deployment.
    #[error("{kind} '{name}' already exists in deployment '{deployment}'")]
    DeploymentConflict {
        /// Object kind.
        kind: &'static str,
        /// Object name.
        name: String,
        /// Deployment that owns the existing object.
        deployment: String,
    },

    /// Submitting an object to the cluster failed.
    #[error("failed to submit {kind} '{name}': {source}")]
    SubmitFailed {
        /// Object kind.
        kind: &'static str,
        /// Object name.
        name: String,
        /// Underlying cluster error.
        #[source]
        source: ClusterError,
    },

    /// Removing an object from the cluster failed.
    #[error("failed to remove {kind} '{name}': {source}")]
    DestroyFailed {
        /// Object kind.
        kind: &'static str,
        /// Object name.
        name: String,
        /// Underlying cluster error.
        #[source]
        source: ClusterError,
    },
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PackError>;

impl PackError {
    /// Creates a new internal error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Cluster(cluster) if cluster.is_retryable())
    }
}

impl ConfigError {
    /// Creates a validation error for a specific field.
    #[must_use]
    pub fn validation(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            field: Some(field.into()),
        }
    }
}

impl TemplateError {
    /// Creates a canonicalization error for a field.
    #[must_use]
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl ClusterError {
    /// Creates an API request error.
    #[must_use]
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::ApiRequestFailed {
            status,
            message: message.into(),
        }
    }

    /// Creates a network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::NetworkError {
            message: message.into(),
        }
    }

    /// Returns true if a retry may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::NetworkError { .. })
    }

    /// Returns the delay the server asked for, in seconds, if it sent one.
    #[must_use]
    pub const fn retry_delay_secs(&self) -> Option<u64> {
        match self {
            Self::RateLimited { retry_after_secs } => Some(*retry_after_secs),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(ClusterError::network("reset").is_retryable());
        assert!(ClusterError::RateLimited { retry_after_secs: 3 }.is_retryable());
        assert!(!ClusterError::api_error(500, "boom").is_retryable());

        let err = PackError::from(ClusterError::network("reset"));
        assert!(err.is_retryable());
        assert!(!PackError::internal("x").is_retryable());
    }

    #[test]
    fn test_retry_delay() {
        assert_eq!(
            ClusterError::RateLimited { retry_after_secs: 7 }.retry_delay_secs(),
            Some(7)
        );
        assert_eq!(ClusterError::network("reset").retry_delay_secs(), None);
        assert_eq!(ClusterError::api_error(400, "bad").retry_delay_secs(), None);
    }

    #[test]
    fn test_conflict_messages_name_the_object() {
        let err = DeployError::DeploymentConflict {
            kind: "job",
            name: String::from("web"),
            deployment: String::from("blue"),
        };
        assert_eq!(err.to_string(), "job 'web' already exists in deployment 'blue'");
    }
}
