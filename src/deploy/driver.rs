//! Drives every deployer of one deployment.
//!
//! The driver routes rendered templates to one deployer per object kind and
//! walks all of them through the stage sequence. Kinds are deployed in
//! dependency order (namespaces, volumes, jobs) and destroyed in reverse.

use futures::future::join_all;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::cluster::{ALL_NAMESPACES, ClusterClient, ClusterResult, ManagedObject, ObjectId, ObjectKind};
use crate::config::DeploymentConfig;
use crate::planner::DeploymentPlan;
use crate::templates::Templates;
use crate::ui::Ui;

use super::context::ErrorContext;
use super::deployer::{Deployer, DeployerError};
use super::job::JobDeployer;
use super::namespace::NamespaceDeployer;
use super::provenance::Provenance;
use super::volume::VolumeDeployer;

/// Creates an unconfigured deployer for `kind`.
#[must_use]
pub fn new_deployer(kind: ObjectKind, client: Arc<dyn ClusterClient>) -> Box<dyn Deployer> {
    match kind {
        ObjectKind::Namespace => Box::new(NamespaceDeployer::new(client)),
        ObjectKind::Volume => Box::new(VolumeDeployer::new(client)),
        ObjectKind::Job => Box::new(JobDeployer::new(client)),
    }
}

/// Runs one deployment across all object kinds.
pub struct DeploymentDriver {
    config: DeploymentConfig,
    client: Arc<dyn ClusterClient>,
    deployers: BTreeMap<ObjectKind, Box<dyn Deployer>>,
}

impl std::fmt::Debug for DeploymentDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stages: BTreeMap<_, _> = self
            .deployers
            .iter()
            .map(|(kind, d)| (*kind, d.stage()))
            .collect();
        f.debug_struct("DeploymentDriver")
            .field("config", &self.config)
            .field("backend", &self.client.backend_type())
            .field("deployers", &stages)
            .finish()
    }
}

impl DeploymentDriver {
    /// Creates a driver with no deployers.
    #[must_use]
    pub fn new(config: DeploymentConfig, client: Arc<dyn ClusterClient>) -> Self {
        Self {
            config,
            client,
            deployers: BTreeMap::new(),
        }
    }

    /// The deployment this driver runs.
    #[must_use]
    pub const fn config(&self) -> &DeploymentConfig {
        &self.config
    }

    /// Context shared by every error of this deployment.
    #[must_use]
    pub fn error_context(&self) -> ErrorContext {
        ErrorContext::new()
            .with(ErrorContext::PACK, self.config.pack_name())
            .with(ErrorContext::REGISTRY, self.config.registry_name())
            .with(ErrorContext::DEPLOYMENT, self.config.deployment_name())
    }

    /// Routes `templates` by kind and creates one configured deployer per
    /// kind present. Replaces any previously loaded deployers.
    pub fn load(&mut self, templates: Templates) -> Vec<DeployerError> {
        self.deployers.clear();
        let mut errors = Vec::new();

        for (kind, subset) in templates.split_by_kind() {
            debug!("Routing {} template(s) to the {} deployer", subset.len(), kind);
            let mut deployer = new_deployer(kind, Arc::clone(&self.client));
            if let Err(e) = deployer.set_deployment_config(self.config.clone()) {
                errors.push(e);
                continue;
            }
            if let Err(e) = deployer.set_templates(subset) {
                errors.push(e);
                continue;
            }
            self.deployers.insert(kind, deployer);
        }

        errors
    }

    /// Creates a config-bound deployer for every kind that has none, so a
    /// deployment can be destroyed without its templates.
    pub fn bind_all_kinds(&mut self) -> Vec<DeployerError> {
        let mut errors = Vec::new();
        for kind in ObjectKind::ALL {
            if self.deployers.contains_key(&kind) {
                continue;
            }
            let mut deployer = new_deployer(kind, Arc::clone(&self.client));
            match deployer.set_deployment_config(self.config.clone()) {
                Ok(()) => {
                    self.deployers.insert(kind, deployer);
                }
                Err(e) => errors.push(e),
            }
        }
        errors
    }

    /// Kinds with a deployer, in deploy order.
    #[must_use]
    pub fn kinds(&self) -> Vec<ObjectKind> {
        self.deployers.keys().copied().collect()
    }

    /// The deployer for `kind`, if templates of that kind were loaded.
    #[must_use]
    pub fn deployer(&self, kind: ObjectKind) -> Option<&dyn Deployer> {
        self.deployers.get(&kind).map(|d| &**d)
    }

    /// Parses, canonicalizes and conflict-checks every deployer.
    ///
    /// Each stage runs for all deployers before the next starts; the first
    /// stage that reports errors ends validation.
    pub async fn validate(&mut self, context: &ErrorContext) -> Vec<DeployerError> {
        info!("Validating deployment '{}'", self.config.deployment_name());

        let errors: Vec<DeployerError> = self
            .deployers
            .values_mut()
            .flat_map(|d| d.parse_templates())
            .collect();
        if !errors.is_empty() {
            warn!("{} template(s) failed to parse", errors.len());
            return errors;
        }

        let errors: Vec<DeployerError> = self
            .deployers
            .values_mut()
            .flat_map(|d| d.canonicalize_templates())
            .collect();
        if !errors.is_empty() {
            warn!("{} template(s) failed validation", errors.len());
            return errors;
        }

        join_all(
            self.deployers
                .values_mut()
                .map(|d| d.check_for_conflicts(context)),
        )
        .await
        .into_iter()
        .flatten()
        .collect()
    }

    /// Prints a plan for every deployer, in deploy order.
    pub async fn plan(&mut self, ui: &dyn Ui) -> Vec<DeployerError> {
        let mut errors = Vec::new();
        for deployer in self.deployers.values_mut() {
            errors.extend(deployer.plan_deployment(ui).await);
        }
        errors
    }

    /// Plans computed by the last [`plan`](Self::plan), in deploy order.
    #[must_use]
    pub fn plans(&self) -> Vec<&DeploymentPlan> {
        self.deployers.values().filter_map(|d| d.last_plan()).collect()
    }

    /// Deploys every kind in dependency order.
    ///
    /// # Errors
    ///
    /// Returns the first submission failure; later kinds are not deployed.
    pub async fn deploy(&mut self, ui: &dyn Ui, context: &ErrorContext) -> Result<(), DeployerError> {
        info!("Deploying {}", self.config);
        for deployer in self.deployers.values_mut() {
            deployer.deploy(ui, context).await?;
        }
        info!("Deployment '{}' complete", self.config.deployment_name());
        Ok(())
    }

    /// Destroys every kind in reverse dependency order, continuing past
    /// failures.
    pub async fn destroy(&mut self, ui: &dyn Ui) -> Vec<DeployerError> {
        info!("Destroying deployment '{}'", self.config.deployment_name());
        let mut errors = Vec::new();
        for deployer in self.deployers.values_mut().rev() {
            errors.extend(deployer.destroy_deployment(ui).await);
        }
        errors
    }
}

/// Live objects of one deployment, as recorded by their provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeploymentSummary {
    /// Deployment name.
    pub deployment_name: String,
    /// Pack name.
    pub pack_name: String,
    /// Pack version.
    pub pack_version: String,
    /// Registry name.
    pub registry_name: String,
    /// Objects tagged with this deployment.
    pub objects: Vec<ObjectId>,
}

fn collect_owned<M: ManagedObject>(objects: &[M], groups: &mut BTreeMap<String, DeploymentSummary>) {
    for object in objects {
        let Some(provenance) = Provenance::of(object) else {
            continue;
        };
        groups
            .entry(provenance.deployment_name.clone())
            .or_insert_with(|| DeploymentSummary {
                deployment_name: provenance.deployment_name,
                pack_name: provenance.pack_name,
                pack_version: provenance.pack_version,
                registry_name: provenance.registry_name,
                objects: Vec::new(),
            })
            .objects
            .push(object.id());
    }
}

/// Lists every pack deployment found in the cluster, by name.
///
/// # Errors
///
/// Returns the first listing failure.
pub async fn list_deployments(client: &dyn ClusterClient) -> ClusterResult<Vec<DeploymentSummary>> {
    let mut groups = BTreeMap::new();
    collect_owned(&client.list_namespaces().await?, &mut groups);
    collect_owned(&client.list_volumes(ALL_NAMESPACES).await?, &mut groups);
    collect_owned(&client.list_jobs(ALL_NAMESPACES).await?, &mut groups);

    Ok(groups
        .into_values()
        .map(|mut summary| {
            summary.objects.sort();
            summary
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::{DEFAULT_NAMESPACE, Job, MemoryCluster, Mutation, Namespace};
    use crate::deploy::Stage;
    use crate::ui::RecordingUi;

    fn config() -> DeploymentConfig {
        DeploymentConfig::new("web", "nginx", "./packs/nginx", "1.2.0", "community")
            .expect("valid config")
    }

    fn pack() -> Templates {
        [
            ("web.job.yaml", "job:\n  name: web\n  namespace: team-a\n  groups:\n    - name: web\n      tasks:\n        - name: nginx\n          driver: docker\n"),
            ("data.volume.yaml", "volume:\n  name: data\n  namespace: team-a\n  plugin_id: hostpath\n"),
            ("team.namespace.yaml", "namespace:\n  name: team-a\n"),
        ]
        .into_iter()
        .collect()
    }

    fn driver() -> (Arc<MemoryCluster>, DeploymentDriver) {
        let cluster = Arc::new(MemoryCluster::new());
        let client: Arc<dyn ClusterClient> = cluster.clone();
        (cluster, DeploymentDriver::new(config(), client))
    }

    #[test]
    fn test_load_creates_one_deployer_per_kind() {
        let (_, mut driver) = driver();
        assert!(driver.load(pack()).is_empty());

        assert_eq!(
            driver.kinds(),
            vec![ObjectKind::Namespace, ObjectKind::Volume, ObjectKind::Job]
        );
        let jobs = driver.deployer(ObjectKind::Job).expect("job deployer");
        assert_eq!(jobs.name(), "job");
        assert_eq!(jobs.stage(), Stage::Configured);
    }

    #[tokio::test]
    async fn test_deploy_in_dependency_order_and_destroy_in_reverse() {
        let (cluster, mut driver) = driver();
        let ui = RecordingUi::new();
        let context = driver.error_context();

        assert!(driver.load(pack()).is_empty());
        assert!(driver.validate(&context).await.is_empty());
        driver.deploy(&ui, &context).await.expect("deploy");

        let applied: Vec<ObjectKind> = cluster
            .mutations()
            .iter()
            .map(|m| match m {
                Mutation::Applied(id) | Mutation::Removed(id) => id.kind,
            })
            .collect();
        assert_eq!(
            applied,
            vec![ObjectKind::Namespace, ObjectKind::Volume, ObjectKind::Job]
        );

        let mut teardown = DeploymentDriver::new(config(), Arc::clone(&driver.client));
        assert!(teardown.bind_all_kinds().is_empty());
        assert!(teardown.destroy(&ui).await.is_empty());

        let removed: Vec<ObjectKind> = cluster.mutations()[3..]
            .iter()
            .map(|m| match m {
                Mutation::Applied(id) | Mutation::Removed(id) => id.kind,
            })
            .collect();
        assert_eq!(
            removed,
            vec![ObjectKind::Job, ObjectKind::Volume, ObjectKind::Namespace]
        );
        assert_eq!(cluster.object_count(), 0);
    }

    #[tokio::test]
    async fn test_validate_stops_after_parse_errors() {
        let (cluster, mut driver) = driver();
        cluster.insert_job(Job::new("web").with_namespace("team-a"));

        let mut templates = pack();
        templates.insert("broken.volume.yaml", "volume: [");
        assert!(driver.load(templates).is_empty());

        let context = driver.error_context();
        let errors = driver.validate(&context).await;
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].subject, "broken.volume.yaml");
        assert_eq!(
            driver.deployer(ObjectKind::Job).map(|d| d.stage()),
            Some(Stage::Parsed)
        );
    }

    #[tokio::test]
    async fn test_list_deployments_groups_by_provenance() {
        let (cluster, _) = driver();
        let mut namespace = Namespace::new("team-a");
        namespace.meta = Some([(String::from("pack-deployment-name"), String::from("web"))].into());
        cluster.insert_namespace(namespace);
        cluster.insert_job(
            Job::new("web")
                .with_meta("pack-deployment-name", "web")
                .with_meta("pack-name", "nginx"),
        );
        cluster.insert_job(Job::new("api").with_meta("pack-deployment-name", "api"));
        cluster.insert_job(Job::new("manual"));

        let summaries = list_deployments(cluster.as_ref()).await.expect("list");
        let names: Vec<&str> = summaries.iter().map(|s| s.deployment_name.as_str()).collect();
        assert_eq!(names, vec!["api", "web"]);
        assert_eq!(summaries[1].objects.len(), 2);
        assert_eq!(summaries[1].objects[0].kind, ObjectKind::Namespace);
        assert_eq!(summaries[1].objects[1].namespace, DEFAULT_NAMESPACE);
    }
}
