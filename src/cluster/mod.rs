//! Cluster integration module.
//!
//! This module provides the object kinds a pack can deploy, the API trait
//! the pipeline talks to, and two backends: an HTTP client and an
//! in-memory cluster.

mod api;
mod http;
mod memory;
mod object;
mod types;

pub use api::{ALL_NAMESPACES, ClusterClient, ClusterResult};
#[cfg(test)]
pub use api::MockClusterClient;
pub use http::{DEFAULT_TIMEOUT_SECS, HttpClusterClient};
pub use memory::{MemoryCluster, Mutation};
pub use object::{ManagedObject, Metadata, ObjectId, ObjectKind};
pub use types::{
    AccessMode, AttachmentMode, DEFAULT_NAMESPACE, Job, JobType, Namespace, Resources, Task,
    TaskGroup, Volume,
};
