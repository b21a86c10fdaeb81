//! In-memory cluster backend.
//!
//! Holds objects in process memory and records every mutation. Used for
//! tests and for rehearsing a deployment without a live cluster.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::sync::{PoisonError, RwLock};
use tracing::debug;

use crate::error::ClusterError;

use super::api::{ALL_NAMESPACES, ClusterClient, ClusterResult};
use super::object::{ManagedObject, ObjectId, ObjectKind};
use super::types::{DEFAULT_NAMESPACE, Job, Namespace, Volume};

/// A mutation applied to the in-memory cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// An object was created or updated.
    Applied(ObjectId),
    /// An object was removed.
    Removed(ObjectId),
}

#[derive(Debug, Default)]
struct Inner {
    jobs: BTreeMap<(String, String), Job>,
    volumes: BTreeMap<(String, String), Volume>,
    namespaces: BTreeMap<String, Namespace>,
    mutations: Vec<Mutation>,
    failing: HashSet<String>,
}

/// In-memory cluster.
#[derive(Debug, Default)]
pub struct MemoryCluster {
    inner: RwLock<Inner>,
}

fn scoped(namespace: Option<&str>) -> String {
    namespace.unwrap_or(DEFAULT_NAMESPACE).to_string()
}

impl MemoryCluster {
    /// Creates an empty cluster.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a job without recording a mutation.
    pub fn insert_job(&self, job: Job) {
        let key = (scoped(job.namespace.as_deref()), job.name.clone());
        self.write().jobs.insert(key, job);
    }

    /// Seeds a volume without recording a mutation.
    pub fn insert_volume(&self, volume: Volume) {
        let key = (scoped(volume.namespace.as_deref()), volume.name.clone());
        self.write().volumes.insert(key, volume);
    }

    /// Seeds a namespace without recording a mutation.
    pub fn insert_namespace(&self, namespace: Namespace) {
        self.write()
            .namespaces
            .insert(namespace.name.clone(), namespace);
    }

    /// Makes every mutation of objects with this name fail.
    pub fn fail_on(&self, name: impl Into<String>) {
        self.write().failing.insert(name.into());
    }

    /// Returns a stored job.
    #[must_use]
    pub fn job(&self, namespace: &str, name: &str) -> Option<Job> {
        self.read()
            .jobs
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    /// Returns a stored volume.
    #[must_use]
    pub fn volume(&self, namespace: &str, name: &str) -> Option<Volume> {
        self.read()
            .volumes
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    /// Returns a stored namespace.
    #[must_use]
    pub fn namespace(&self, name: &str) -> Option<Namespace> {
        self.read().namespaces.get(name).cloned()
    }

    /// Returns every mutation applied so far, in order.
    #[must_use]
    pub fn mutations(&self) -> Vec<Mutation> {
        self.read().mutations.clone()
    }

    /// Returns the total number of stored objects.
    #[must_use]
    pub fn object_count(&self) -> usize {
        let inner = self.read();
        inner.jobs.len() + inner.volumes.len() + inner.namespaces.len()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_failure(inner: &Inner, name: &str) -> ClusterResult<()> {
        if inner.failing.contains(name) {
            return Err(ClusterError::api_error(500, format!("injected failure for {name}")));
        }
        Ok(())
    }
}

fn missing(kind: ObjectKind, name: &str) -> ClusterError {
    ClusterError::NotFound {
        kind: kind.to_string(),
        name: name.to_string(),
    }
}

#[async_trait]
impl ClusterClient for MemoryCluster {
    async fn list_jobs(&self, namespace: &str) -> ClusterResult<Vec<Job>> {
        Ok(self
            .read()
            .jobs
            .iter()
            .filter(|((ns, _), _)| namespace == ALL_NAMESPACES || namespace == ns.as_str())
            .map(|(_, job)| job.clone())
            .collect())
    }

    async fn register_job(&self, job: &Job) -> ClusterResult<()> {
        let mut inner = self.write();
        Self::check_failure(&inner, &job.name)?;
        debug!("Registering job {}", job.name);

        let key = (scoped(job.namespace.as_deref()), job.name.clone());
        inner.jobs.insert(key, job.clone());
        inner.mutations.push(Mutation::Applied(job.id()));
        Ok(())
    }

    async fn deregister_job(&self, namespace: &str, name: &str) -> ClusterResult<()> {
        let mut inner = self.write();
        Self::check_failure(&inner, name)?;

        let job = inner
            .jobs
            .remove(&(namespace.to_string(), name.to_string()))
            .ok_or_else(|| missing(ObjectKind::Job, name))?;
        inner.mutations.push(Mutation::Removed(job.id()));
        Ok(())
    }

    async fn list_volumes(&self, namespace: &str) -> ClusterResult<Vec<Volume>> {
        Ok(self
            .read()
            .volumes
            .iter()
            .filter(|((ns, _), _)| namespace == ALL_NAMESPACES || namespace == ns.as_str())
            .map(|(_, volume)| volume.clone())
            .collect())
    }

    async fn create_volume(&self, volume: &Volume) -> ClusterResult<()> {
        let mut inner = self.write();
        Self::check_failure(&inner, &volume.name)?;

        let key = (scoped(volume.namespace.as_deref()), volume.name.clone());
        inner.volumes.insert(key, volume.clone());
        inner.mutations.push(Mutation::Applied(volume.id()));
        Ok(())
    }

    async fn delete_volume(&self, namespace: &str, name: &str) -> ClusterResult<()> {
        let mut inner = self.write();
        Self::check_failure(&inner, name)?;

        let volume = inner
            .volumes
            .remove(&(namespace.to_string(), name.to_string()))
            .ok_or_else(|| missing(ObjectKind::Volume, name))?;
        inner.mutations.push(Mutation::Removed(volume.id()));
        Ok(())
    }

    async fn list_namespaces(&self) -> ClusterResult<Vec<Namespace>> {
        Ok(self.read().namespaces.values().cloned().collect())
    }

    async fn apply_namespace(&self, namespace: &Namespace) -> ClusterResult<()> {
        let mut inner = self.write();
        Self::check_failure(&inner, &namespace.name)?;

        inner
            .namespaces
            .insert(namespace.name.clone(), namespace.clone());
        inner.mutations.push(Mutation::Applied(namespace.id()));
        Ok(())
    }

    async fn delete_namespace(&self, name: &str) -> ClusterResult<()> {
        let mut inner = self.write();
        Self::check_failure(&inner, name)?;

        let namespace = inner
            .namespaces
            .remove(name)
            .ok_or_else(|| missing(ObjectKind::Namespace, name))?;
        inner.mutations.push(Mutation::Removed(namespace.id()));
        Ok(())
    }

    fn backend_type(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_register_and_list() {
        let cluster = MemoryCluster::new();
        cluster
            .register_job(&Job::new("web").with_namespace("apps"))
            .await
            .expect("register");

        assert_eq!(cluster.list_jobs(ALL_NAMESPACES).await.expect("list").len(), 1);
        assert_eq!(cluster.list_jobs("apps").await.expect("list").len(), 1);
        assert!(cluster.list_jobs("default").await.expect("list").is_empty());
        assert_eq!(cluster.mutations().len(), 1);
    }

    #[tokio::test]
    async fn test_seeding_does_not_record_mutations() {
        let cluster = MemoryCluster::new();
        cluster.insert_job(Job::new("web"));
        cluster.insert_namespace(Namespace::new("team"));

        assert_eq!(cluster.object_count(), 2);
        assert!(cluster.mutations().is_empty());
        assert!(cluster.job("default", "web").is_some());
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let cluster = MemoryCluster::new();
        cluster.fail_on("web");

        let err = cluster.register_job(&Job::new("web")).await.expect_err("should fail");
        assert!(matches!(err, ClusterError::ApiRequestFailed { status: 500, .. }));
        assert_eq!(cluster.object_count(), 0);
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let cluster = MemoryCluster::new();
        let err = cluster.delete_volume("default", "data").await.expect_err("should fail");
        assert!(matches!(err, ClusterError::NotFound { .. }));
    }
}
