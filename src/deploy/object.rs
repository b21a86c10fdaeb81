//! Generic deployer shared by every object kind.
//!
//! [`ObjectDeployer`] owns the templates and parsed objects of one kind and
//! walks them through the [`Stage`] sequence. Everything kind-specific is
//! delegated to [`DeployKind`].

use async_trait::async_trait;
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::cluster::{ClusterClient, ObjectId};
use crate::config::DeploymentConfig;
use crate::error::{DeployError, TemplateError};
use crate::planner::{DeploymentPlan, DiffEngine};
use crate::templates::Templates;
use crate::ui::Ui;

use super::conflict::conflict_for;
use super::context::ErrorContext;
use super::deployer::{Deployer, DeployerError, ParsedTemplates};
use super::kind::DeployKind;
use super::provenance::{Provenance, tag};
use super::stage::{Operation, Stage};

/// Deployer for objects of kind `M`.
pub struct ObjectDeployer<M> {
    client: Arc<dyn ClusterClient>,
    config: Option<DeploymentConfig>,
    templates: Templates,
    parsed: BTreeMap<String, M>,
    plan: Option<DeploymentPlan>,
    stage: Stage,
}

impl<M: DeployKind> std::fmt::Debug for ObjectDeployer<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectDeployer")
            .field("kind", &M::KIND)
            .field("backend", &self.client.backend_type())
            .field("config", &self.config)
            .field("templates", &self.templates.len())
            .field("parsed", &self.parsed.keys().collect::<Vec<_>>())
            .field("stage", &self.stage)
            .finish()
    }
}

impl<M: DeployKind> ObjectDeployer<M> {
    /// Creates an unconfigured deployer talking to `client`.
    #[must_use]
    pub fn new(client: Arc<dyn ClusterClient>) -> Self {
        Self {
            client,
            config: None,
            templates: Templates::new(),
            parsed: BTreeMap::new(),
            plan: None,
            stage: Stage::Unconfigured,
        }
    }

    /// Parsed objects keyed by template name.
    #[must_use]
    pub const fn parsed(&self) -> &BTreeMap<String, M> {
        &self.parsed
    }

    /// The bound deployment config.
    #[must_use]
    pub const fn deployment_config(&self) -> Option<&DeploymentConfig> {
        self.config.as_ref()
    }

    fn context(&self) -> ErrorContext {
        let mut context = ErrorContext::new();
        if let Some(config) = &self.config {
            context.append(ErrorContext::PACK, config.pack_name());
            context.append(ErrorContext::REGISTRY, config.registry_name());
            context.append(ErrorContext::DEPLOYMENT, config.deployment_name());
        }
        context.with(ErrorContext::KIND, M::KIND.as_str())
    }

    fn stage_error(&self, operation: Operation) -> DeployerError {
        DeployerError::new(
            DeployError::StageOrder {
                operation: operation.as_str(),
                stage: self.stage.as_str(),
            },
            M::KIND.as_str(),
            self.context(),
        )
    }

    /// Returns the bound config if `operation` may run now.
    fn check_stage(&self, operation: Operation) -> Result<DeploymentConfig, DeployerError> {
        match &self.config {
            Some(config) if self.stage.permits(operation) => Ok(config.clone()),
            _ => Err(self.stage_error(operation)),
        }
    }

    fn advance(&mut self, operation: Operation) {
        let next = self.stage.after(operation);
        if next != self.stage {
            debug!("{} deployer: {} -> {}", M::KIND, self.stage, next);
        }
        self.stage = next;
    }
}

#[async_trait]
impl<M: DeployKind> Deployer for ObjectDeployer<M> {
    fn name(&self) -> &'static str {
        M::KIND.as_str()
    }

    fn stage(&self) -> Stage {
        self.stage
    }

    fn set_deployment_config(&mut self, config: DeploymentConfig) -> Result<(), DeployerError> {
        if let Some(existing) = &self.config {
            return Err(DeployerError::new(
                DeployError::AlreadyConfigured {
                    deployment: existing.deployment_name().to_string(),
                },
                M::KIND.as_str(),
                self.context(),
            ));
        }
        if !self.stage.permits(Operation::SetConfig) {
            return Err(self.stage_error(Operation::SetConfig));
        }

        debug!("Binding {} deployer to {}", M::KIND, config);
        self.config = Some(config);
        self.advance(Operation::SetConfig);
        Ok(())
    }

    fn set_templates(&mut self, templates: Templates) -> Result<(), DeployerError> {
        self.check_stage(Operation::SetTemplates)?;
        self.templates = templates;
        self.advance(Operation::SetTemplates);
        Ok(())
    }

    fn parse_templates(&mut self) -> Vec<DeployerError> {
        if let Err(e) = self.check_stage(Operation::Parse) {
            return vec![e];
        }

        let base = self.context();
        let mut errors = Vec::new();
        for (template, text) in self.templates.iter() {
            match M::parse(text) {
                Ok(object) => {
                    debug!("Parsed {} template '{}'", M::KIND, template);
                    self.parsed.insert(template.to_string(), object);
                }
                Err(e) => {
                    warn!("Failed to parse {} template '{}': {}", M::KIND, template, e);
                    errors.push(DeployerError::new(
                        e,
                        template,
                        base.layered().with(ErrorContext::TEMPLATE, template),
                    ));
                }
            }
        }

        self.advance(Operation::Parse);
        errors
    }

    fn canonicalize_templates(&mut self) -> Vec<DeployerError> {
        if let Err(e) = self.check_stage(Operation::Canonicalize) {
            return vec![e];
        }

        let base = self.context();
        let mut errors = Vec::new();
        let mut rejected = Vec::new();
        let mut seen: HashMap<ObjectId, String> = HashMap::new();

        for (template, object) in &mut self.parsed {
            let context = base.layered().with(ErrorContext::TEMPLATE, template.as_str());

            let problems = object.canonicalize();
            if !problems.is_empty() {
                rejected.push(template.clone());
                errors.extend(
                    problems
                        .into_iter()
                        .map(|p| DeployerError::new(p, template.as_str(), context.clone())),
                );
                continue;
            }

            let id = object.id();
            match seen.entry(id) {
                Entry::Occupied(first) => {
                    let problem = TemplateError::invalid(
                        format!("{}.name", M::KIND),
                        format!("{} is already defined by template '{}'", first.key(), first.get()),
                    );
                    rejected.push(template.clone());
                    errors.push(DeployerError::new(problem, template.as_str(), context));
                }
                Entry::Vacant(slot) => {
                    slot.insert(template.clone());
                }
            }
        }

        for template in &rejected {
            self.parsed.remove(template);
        }

        self.advance(Operation::Canonicalize);
        errors
    }

    async fn check_for_conflicts(&mut self, context: &ErrorContext) -> Vec<DeployerError> {
        let config = match self.check_stage(Operation::CheckConflicts) {
            Ok(config) => config,
            Err(e) => return vec![e],
        };
        let base = context.layered().with(ErrorContext::KIND, M::KIND.as_str());

        let live = match M::list(self.client.as_ref()).await {
            Ok(live) => live,
            Err(e) => return vec![DeployerError::new(e, M::KIND.as_str(), base)],
        };
        let live_by_id: HashMap<ObjectId, &M> = live.iter().map(|o| (o.id(), o)).collect();

        let errors: Vec<DeployerError> = self
            .parsed
            .iter()
            .filter_map(|(template, object)| {
                let id = object.id();
                let existing = live_by_id.get(&id)?;
                let conflict = conflict_for(*existing, config.deployment_name())?;
                Some(DeployerError::new(
                    conflict,
                    template.as_str(),
                    base.layered()
                        .with(ErrorContext::TEMPLATE, template.as_str())
                        .with(ErrorContext::OBJECT, id.to_string()),
                ))
            })
            .collect();

        if errors.is_empty() {
            debug!("No conflicting {}s for deployment '{}'", M::KIND, config.deployment_name());
        } else {
            warn!("Found {} conflicting {}(s)", errors.len(), M::KIND);
        }

        self.advance(Operation::CheckConflicts);
        errors
    }

    async fn plan_deployment(&mut self, ui: &dyn Ui) -> Vec<DeployerError> {
        let config = match self.check_stage(Operation::Plan) {
            Ok(config) => config,
            Err(e) => return vec![e],
        };

        let live = match M::list(self.client.as_ref()).await {
            Ok(live) => live,
            Err(e) => return vec![DeployerError::new(e, M::KIND.as_str(), self.context())],
        };

        let intended: BTreeMap<String, M> = self
            .parsed
            .iter()
            .map(|(template, object)| {
                let mut object = object.clone();
                tag(&mut object, &config);
                (template.clone(), object)
            })
            .collect();

        let diff = DiffEngine::new().compute_diff(&intended, &live);
        let plan = DeploymentPlan::from_diff(config.deployment_name(), M::KIND, &diff);
        debug!("Planned {} {} action(s)", plan.action_count(), M::KIND);
        ui.plan(&plan);

        self.plan = Some(plan);
        self.advance(Operation::Plan);
        Vec::new()
    }

    async fn deploy(&mut self, ui: &dyn Ui, context: &ErrorContext) -> Result<(), DeployerError> {
        let config = self.check_stage(Operation::Deploy)?;
        // Deploy runs once, even when a submission fails.
        self.advance(Operation::Deploy);

        let total = self.parsed.len();
        if total == 0 {
            ui.info(&format!("No {} templates to deploy", M::KIND));
            return Ok(());
        }

        let base = context.layered().with(ErrorContext::KIND, M::KIND.as_str());
        for (done, (template, object)) in self.parsed.iter_mut().enumerate() {
            tag(object, &config);

            if let Err(source) = object.submit(self.client.as_ref()).await {
                let id = object.id();
                error!("Failed to submit {}: {}", id, source);
                if done > 0 {
                    ui.warning(&format!(
                        "Deployed {done} of {total} {}s before the failure; they were left in place",
                        M::KIND
                    ));
                }
                return Err(DeployerError::new(
                    DeployError::SubmitFailed {
                        kind: M::KIND.as_str(),
                        name: object.name().to_string(),
                        source,
                    },
                    template.as_str(),
                    base.layered()
                        .with(ErrorContext::TEMPLATE, template.as_str())
                        .with(ErrorContext::OBJECT, id.to_string()),
                ));
            }

            info!("Deployed {}", object.id());
            ui.success(&format!("Deployed {} '{}'", M::KIND, object.name()));
        }

        Ok(())
    }

    async fn destroy_deployment(&mut self, ui: &dyn Ui) -> Vec<DeployerError> {
        let config = match self.check_stage(Operation::Destroy) {
            Ok(config) => config,
            Err(e) => return vec![e],
        };
        let base = self.context();

        let live = match M::list(self.client.as_ref()).await {
            Ok(live) => live,
            Err(e) => return vec![DeployerError::new(e, M::KIND.as_str(), base)],
        };

        let owned: Vec<ObjectId> = live
            .iter()
            .filter(|o| Provenance::of(*o).is_some_and(|p| p.belongs_to(config.deployment_name())))
            .map(|o| o.id())
            .collect();

        if owned.is_empty() {
            ui.info(&format!(
                "No {}s found for deployment '{}'",
                M::KIND,
                config.deployment_name()
            ));
        }

        let mut errors = Vec::new();
        for id in &owned {
            match M::remove(self.client.as_ref(), id).await {
                Ok(()) => {
                    info!("Removed {}", id);
                    ui.success(&format!("Removed {id}"));
                }
                Err(source) => {
                    warn!("Failed to remove {}: {}", id, source);
                    errors.push(DeployerError::new(
                        DeployError::DestroyFailed {
                            kind: M::KIND.as_str(),
                            name: id.name.clone(),
                            source,
                        },
                        id.to_string(),
                        base.layered().with(ErrorContext::OBJECT, id.to_string()),
                    ));
                }
            }
        }

        self.advance(Operation::Destroy);
        errors
    }

    fn parsed_templates(&self) -> ParsedTemplates<'_> {
        M::view(&self.parsed)
    }

    fn last_plan(&self) -> Option<&DeploymentPlan> {
        self.plan.as_ref()
    }
}
