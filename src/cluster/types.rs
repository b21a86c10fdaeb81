//! Cluster object definitions.
//!
//! These are the decoded forms of rendered templates and the shapes
//! exchanged with the cluster API.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::object::{ManagedObject, Metadata, ObjectKind};

/// Namespace assumed for namespaced objects that do not name one.
pub const DEFAULT_NAMESPACE: &str = "default";

/// A job definition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Job {
    /// Job name, unique within its namespace.
    pub name: String,
    /// Namespace to run in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Region to run in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Datacenters eligible for placement.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub datacenters: Vec<String>,
    /// Scheduler type.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub job_type: Option<JobType>,
    /// Scheduling priority.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,
    /// Job metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Metadata>,
    /// Task groups.
    #[serde(default)]
    pub groups: Vec<TaskGroup>,
}

/// Scheduler types for jobs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum JobType {
    /// Long-running service.
    #[default]
    Service,
    /// Run-to-completion batch work.
    Batch,
    /// One allocation per node.
    System,
}

/// A group of tasks placed together.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TaskGroup {
    /// Group name, unique within the job.
    pub name: String,
    /// Number of instances.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
    /// Tasks in this group.
    #[serde(default)]
    pub tasks: Vec<Task>,
}

/// A single task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Task {
    /// Task name, unique within the group.
    pub name: String,
    /// Task driver (e.g. `docker`, `exec`).
    #[serde(default)]
    pub driver: String,
    /// Driver-specific configuration.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub config: BTreeMap<String, serde_json::Value>,
    /// Environment variables.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
    /// Resource reservation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<Resources>,
}

/// Task resource reservation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Resources {
    /// CPU in MHz.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu: Option<u32>,
    /// Memory in MB.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_mb: Option<u32>,
}

/// A storage volume.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Volume {
    /// Volume name, unique within its namespace.
    pub name: String,
    /// Namespace the volume is registered in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Storage plugin that provisions the volume.
    #[serde(default)]
    pub plugin_id: String,
    /// Minimum capacity in MB.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity_min_mb: Option<u64>,
    /// Maximum capacity in MB.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity_max_mb: Option<u64>,
    /// Access mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_mode: Option<AccessMode>,
    /// Attachment mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment_mode: Option<AttachmentMode>,
    /// Volume metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Metadata>,
}

/// Volume access modes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum AccessMode {
    /// One node may read and write.
    #[default]
    SingleNodeWriter,
    /// One node may read.
    SingleNodeReader,
    /// Many nodes may read.
    MultiNodeReader,
    /// Many nodes may read and write.
    MultiNodeMultiWriter,
}

/// Volume attachment modes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum AttachmentMode {
    /// Mounted as a filesystem.
    #[default]
    FileSystem,
    /// Attached as a raw block device.
    BlockDevice,
}

/// A namespace.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Namespace {
    /// Namespace name.
    pub name: String,
    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Namespace metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Metadata>,
}

impl Job {
    /// Creates a job with a name and no groups.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            region: None,
            datacenters: Vec::new(),
            job_type: None,
            priority: None,
            meta: None,
            groups: Vec::new(),
        }
    }

    /// Sets the namespace.
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Adds a metadata entry.
    #[must_use]
    pub fn with_meta(mut self, key: &str, value: &str) -> Self {
        self.meta
            .get_or_insert_with(Metadata::new)
            .insert(key.to_string(), value.to_string());
        self
    }

    /// Returns the total number of task instances across all groups.
    #[must_use]
    pub fn total_count(&self) -> u32 {
        self.groups.iter().map(|g| g.count.unwrap_or(1)).sum()
    }
}

impl Volume {
    /// Creates a volume with a name and plugin.
    #[must_use]
    pub fn new(name: impl Into<String>, plugin_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            plugin_id: plugin_id.into(),
            capacity_min_mb: None,
            capacity_max_mb: None,
            access_mode: None,
            attachment_mode: None,
            meta: None,
        }
    }
}

impl Namespace {
    /// Creates a namespace with a name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            meta: None,
        }
    }
}

impl ManagedObject for Job {
    const KIND: ObjectKind = ObjectKind::Job;

    fn name(&self) -> &str {
        &self.name
    }

    fn namespace(&self) -> Option<&str> {
        Some(self.namespace.as_deref().unwrap_or(DEFAULT_NAMESPACE))
    }

    fn meta(&self) -> Option<&Metadata> {
        self.meta.as_ref()
    }

    fn set_meta(&mut self, meta: Metadata) {
        self.meta = Some(meta);
    }

    fn take_meta(&mut self) -> Option<Metadata> {
        self.meta.take()
    }
}

impl ManagedObject for Volume {
    const KIND: ObjectKind = ObjectKind::Volume;

    fn name(&self) -> &str {
        &self.name
    }

    fn namespace(&self) -> Option<&str> {
        Some(self.namespace.as_deref().unwrap_or(DEFAULT_NAMESPACE))
    }

    fn meta(&self) -> Option<&Metadata> {
        self.meta.as_ref()
    }

    fn set_meta(&mut self, meta: Metadata) {
        self.meta = Some(meta);
    }

    fn take_meta(&mut self) -> Option<Metadata> {
        self.meta.take()
    }
}

impl ManagedObject for Namespace {
    const KIND: ObjectKind = ObjectKind::Namespace;

    fn name(&self) -> &str {
        &self.name
    }

    fn namespace(&self) -> Option<&str> {
        None
    }

    fn meta(&self) -> Option<&Metadata> {
        self.meta.as_ref()
    }

    fn set_meta(&mut self, meta: Metadata) {
        self.meta = Some(meta);
    }

    fn take_meta(&mut self) -> Option<Metadata> {
        self.meta.take()
    }
}

impl std::fmt::Display for JobType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Service => "service",
            Self::Batch => "batch",
            Self::System => "system",
        };
        write!(f, "{s}")
    }
}
