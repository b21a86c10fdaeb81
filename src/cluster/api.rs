//! Cluster API trait definition.
//!
//! This module defines the interface the deployment pipeline uses to read
//! and mutate cluster state.

use async_trait::async_trait;

use crate::error::ClusterError;

use super::types::{Job, Namespace, Volume};

/// Result type for cluster API calls.
pub type ClusterResult<T> = std::result::Result<T, ClusterError>;

/// Namespace filter matching every namespace.
pub const ALL_NAMESPACES: &str = "*";

/// Trait for cluster API backends.
///
/// Implementations must be safe to share between deployers running
/// concurrently.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClusterClient: Send + Sync {
    /// Lists jobs in `namespace`, or in every namespace for [`ALL_NAMESPACES`].
    async fn list_jobs(&self, namespace: &str) -> ClusterResult<Vec<Job>>;

    /// Creates or updates a job.
    async fn register_job(&self, job: &Job) -> ClusterResult<()>;

    /// Stops and purges a job.
    async fn deregister_job(&self, namespace: &str, name: &str) -> ClusterResult<()>;

    /// Lists volumes in `namespace`, or in every namespace for [`ALL_NAMESPACES`].
    async fn list_volumes(&self, namespace: &str) -> ClusterResult<Vec<Volume>>;

    /// Creates or updates a volume.
    async fn create_volume(&self, volume: &Volume) -> ClusterResult<()>;

    /// Deletes a volume.
    async fn delete_volume(&self, namespace: &str, name: &str) -> ClusterResult<()>;

    /// Lists namespaces.
    async fn list_namespaces(&self) -> ClusterResult<Vec<Namespace>>;

    /// Creates or updates a namespace.
    async fn apply_namespace(&self, namespace: &Namespace) -> ClusterResult<()>;

    /// Deletes a namespace.
    async fn delete_namespace(&self, name: &str) -> ClusterResult<()>;

    /// Gets the backend type name.
    fn backend_type(&self) -> &'static str;
}
