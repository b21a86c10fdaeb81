//! Deployment pipeline.
//!
//! One [`Deployer`] per object kind takes rendered templates through parse,
//! canonicalize, conflict check, plan and deploy, or destroys what an
//! earlier deploy left behind. [`DeploymentDriver`] runs all of them for a
//! single deployment.

mod conflict;
mod context;
mod deployer;
mod driver;
mod job;
mod kind;
mod namespace;
mod object;
mod provenance;
mod stage;
mod volume;

pub use conflict::{Ownership, conflict_for};
pub use context::ErrorContext;
pub use deployer::{Deployer, DeployerError, ParsedTemplates};
pub use driver::{DeploymentDriver, DeploymentSummary, list_deployments, new_deployer};
pub use job::JobDeployer;
pub use kind::{DeployKind, parse_document};
pub use namespace::NamespaceDeployer;
pub use object::ObjectDeployer;
pub use provenance::{Provenance, ProvenanceKey, tag};
pub use stage::{Operation, Stage};
pub use volume::VolumeDeployer;
