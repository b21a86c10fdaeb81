//! Job templates.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};

use crate::cluster::{
    ALL_NAMESPACES, ClusterClient, ClusterResult, DEFAULT_NAMESPACE, Job, JobType, ObjectId, Resources,
};
use crate::error::TemplateError;

use super::deployer::ParsedTemplates;
use super::kind::{DeployKind, check_namespace, is_valid_identifier, parse_document};
use super::object::ObjectDeployer;

/// Deployer for jobs.
pub type JobDeployer = ObjectDeployer<Job>;

const DEFAULT_REGION: &str = "global";
const DEFAULT_DATACENTER: &str = "*";
const DEFAULT_PRIORITY: u8 = 50;
const MAX_PRIORITY: u8 = 100;
const DEFAULT_CPU_MHZ: u32 = 100;
const DEFAULT_MEMORY_MB: u32 = 300;

#[async_trait]
impl DeployKind for Job {
    fn parse(text: &str) -> Result<Self, TemplateError> {
        parse_document(text, "job")
    }

    fn canonicalize(&mut self) -> Vec<TemplateError> {
        let mut errors = Vec::new();

        if !is_valid_identifier(&self.name) {
            errors.push(TemplateError::invalid(
                "job.name",
                format!(
                    "'{}' must be non-empty and use only letters, digits, '-', '_' or '.'",
                    self.name
                ),
            ));
        }

        let namespace = self.namespace.get_or_insert_with(|| DEFAULT_NAMESPACE.to_string());
        errors.extend(check_namespace("job.namespace", namespace));
        self.region.get_or_insert_with(|| DEFAULT_REGION.to_string());
        if self.datacenters.is_empty() {
            self.datacenters.push(DEFAULT_DATACENTER.to_string());
        }
        self.job_type.get_or_insert(JobType::Service);

        let priority = *self.priority.get_or_insert(DEFAULT_PRIORITY);
        if !(1..=MAX_PRIORITY).contains(&priority) {
            errors.push(TemplateError::invalid(
                "job.priority",
                format!("{priority} is outside 1..={MAX_PRIORITY}"),
            ));
        }

        if self.groups.is_empty() {
            errors.push(TemplateError::invalid(
                "job.groups",
                "a job needs at least one group",
            ));
        }

        let mut group_names = HashSet::new();
        for (gi, group) in self.groups.iter_mut().enumerate() {
            let prefix = format!("job.groups[{gi}]");

            if group.name.trim().is_empty() {
                errors.push(TemplateError::invalid(format!("{prefix}.name"), "must not be empty"));
            } else if !group_names.insert(group.name.clone()) {
                errors.push(TemplateError::invalid(
                    format!("{prefix}.name"),
                    format!("duplicate group '{}'", group.name),
                ));
            }

            group.count.get_or_insert(1);

            if group.tasks.is_empty() {
                errors.push(TemplateError::invalid(
                    format!("{prefix}.tasks"),
                    "a group needs at least one task",
                ));
            }

            let mut task_names = HashSet::new();
            for (ti, task) in group.tasks.iter_mut().enumerate() {
                let prefix = format!("{prefix}.tasks[{ti}]");

                if task.name.trim().is_empty() {
                    errors.push(TemplateError::invalid(format!("{prefix}.name"), "must not be empty"));
                } else if !task_names.insert(task.name.clone()) {
                    errors.push(TemplateError::invalid(
                        format!("{prefix}.name"),
                        format!("duplicate task '{}'", task.name),
                    ));
                }

                if task.driver.trim().is_empty() {
                    errors.push(TemplateError::invalid(format!("{prefix}.driver"), "must not be empty"));
                }

                let resources = task.resources.get_or_insert(Resources {
                    cpu: None,
                    memory_mb: None,
                });
                resources.cpu.get_or_insert(DEFAULT_CPU_MHZ);
                resources.memory_mb.get_or_insert(DEFAULT_MEMORY_MB);
                if resources.cpu == Some(0) || resources.memory_mb == Some(0) {
                    errors.push(TemplateError::invalid(
                        format!("{prefix}.resources"),
                        "cpu and memory_mb must be positive",
                    ));
                }
            }
        }

        errors
    }

    fn view(parsed: &BTreeMap<String, Self>) -> ParsedTemplates<'_> {
        ParsedTemplates::Jobs(parsed)
    }

    async fn list(client: &dyn ClusterClient) -> ClusterResult<Vec<Self>> {
        client.list_jobs(ALL_NAMESPACES).await
    }

    async fn submit(&self, client: &dyn ClusterClient) -> ClusterResult<()> {
        client.register_job(self).await
    }

    async fn remove(client: &dyn ClusterClient, id: &ObjectId) -> ClusterResult<()> {
        client.deregister_job(&id.namespace, &id.name).await
    }
}
