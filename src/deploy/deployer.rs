//! The deployer lifecycle contract.

use async_trait::async_trait;
use std::collections::BTreeMap;

use crate::cluster::{Job, Namespace, Volume};
use crate::config::DeploymentConfig;
use crate::error::PackError;
use crate::planner::DeploymentPlan;
use crate::templates::Templates;
use crate::ui::Ui;

use super::context::ErrorContext;
use super::stage::Stage;

/// An error reported by a deployer stage.
///
/// Validation stages return every error they find; deploy returns at most
/// one.
#[derive(Debug)]
pub struct DeployerError {
    /// Underlying error.
    pub error: PackError,
    /// Template or object the error is about.
    pub subject: String,
    /// Where the error happened.
    pub context: ErrorContext,
}

impl DeployerError {
    /// Creates a deployer error.
    #[must_use]
    pub fn new(
        error: impl Into<PackError>,
        subject: impl Into<String>,
        context: ErrorContext,
    ) -> Self {
        Self {
            error: error.into(),
            subject: subject.into(),
            context,
        }
    }
}

impl std::fmt::Display for DeployerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.subject, self.error)
    }
}

impl std::error::Error for DeployerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Parsed templates of one deployer, by kind.
#[derive(Debug, Clone, Copy)]
pub enum ParsedTemplates<'a> {
    /// Jobs keyed by template name.
    Jobs(&'a BTreeMap<String, Job>),
    /// Volumes keyed by template name.
    Volumes(&'a BTreeMap<String, Volume>),
    /// Namespaces keyed by template name.
    Namespaces(&'a BTreeMap<String, Namespace>),
}

impl ParsedTemplates<'_> {
    /// Returns the number of parsed templates.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Jobs(m) => m.len(),
            Self::Volumes(m) => m.len(),
            Self::Namespaces(m) => m.len(),
        }
    }

    /// Returns true if nothing was parsed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the template names, in order.
    #[must_use]
    pub fn template_names(&self) -> Vec<&str> {
        match self {
            Self::Jobs(m) => m.keys().map(String::as_str).collect(),
            Self::Volumes(m) => m.keys().map(String::as_str).collect(),
            Self::Namespaces(m) => m.keys().map(String::as_str).collect(),
        }
    }

    /// Returns the jobs, if this is a job deployer.
    #[must_use]
    pub const fn jobs(&self) -> Option<&BTreeMap<String, Job>> {
        match *self {
            Self::Jobs(m) => Some(m),
            _ => None,
        }
    }

    /// Returns the volumes, if this is a volume deployer.
    #[must_use]
    pub const fn volumes(&self) -> Option<&BTreeMap<String, Volume>> {
        match *self {
            Self::Volumes(m) => Some(m),
            _ => None,
        }
    }

    /// Returns the namespaces, if this is a namespace deployer.
    #[must_use]
    pub const fn namespaces(&self) -> Option<&BTreeMap<String, Namespace>> {
        match *self {
            Self::Namespaces(m) => Some(m),
            _ => None,
        }
    }
}

/// Lifecycle contract for deploying one kind of cluster object.
///
/// A deployer is driven through [`Stage`]s in a fixed order:
/// config, templates, parse, canonicalize, then any mix of conflict checks
/// and plans, then deploy. Destroy needs only a bound config. Calling a
/// stage out of order yields a stage-order error and changes nothing.
#[async_trait]
pub trait Deployer: Send + Sync {
    /// Kind of object this deployer handles.
    fn name(&self) -> &'static str;

    /// Current lifecycle stage.
    fn stage(&self) -> Stage;

    /// Binds the deployment config. Allowed once.
    ///
    /// # Errors
    ///
    /// Returns an error if a config is already bound.
    fn set_deployment_config(&mut self, config: DeploymentConfig) -> Result<(), DeployerError>;

    /// Supplies the rendered templates.
    ///
    /// # Errors
    ///
    /// Returns an error unless a config is bound and templates were not yet set.
    fn set_templates(&mut self, templates: Templates) -> Result<(), DeployerError>;

    /// Decodes every template, reporting one error per malformed template.
    fn parse_templates(&mut self) -> Vec<DeployerError>;

    /// Fills defaults and validates the decoded objects.
    fn canonicalize_templates(&mut self) -> Vec<DeployerError>;

    /// Reports one error per live object that collides with an intended
    /// object and is not owned by this deployment.
    async fn check_for_conflicts(&mut self, context: &ErrorContext) -> Vec<DeployerError>;

    /// Prints what a deploy would do, without mutating the cluster.
    async fn plan_deployment(&mut self, ui: &dyn Ui) -> Vec<DeployerError>;

    /// Tags and submits every object, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns the first submission failure.
    async fn deploy(&mut self, ui: &dyn Ui, context: &ErrorContext) -> Result<(), DeployerError>;

    /// Removes every live object of this kind tagged with the bound
    /// deployment name.
    async fn destroy_deployment(&mut self, ui: &dyn Ui) -> Vec<DeployerError>;

    /// Returns the parsed objects.
    fn parsed_templates(&self) -> ParsedTemplates<'_>;

    /// Returns the most recent plan, if one was computed.
    fn last_plan(&self) -> Option<&DeploymentPlan>;
}
