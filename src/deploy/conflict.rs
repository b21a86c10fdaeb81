//! Conflict detection against live objects.

use crate::cluster::{ManagedObject, Metadata};
use crate::error::DeployError;

use super::provenance::ProvenanceKey;

/// Who owns a live object, relative to one deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership<'a> {
    /// Tagged with the deployment being checked.
    Owned,
    /// Carries no pack provenance.
    Unmanaged,
    /// Tagged with another deployment.
    Foreign(&'a str),
}

impl<'a> Ownership<'a> {
    /// Classifies metadata against `deployment`.
    #[must_use]
    pub fn of(meta: Option<&'a Metadata>, deployment: &str) -> Self {
        match meta
            .and_then(|m| m.get(ProvenanceKey::DeploymentName.as_str()))
            .map(String::as_str)
        {
            None => Self::Unmanaged,
            Some(owner) if owner == deployment => Self::Owned,
            Some(owner) => Self::Foreign(owner),
        }
    }
}

/// Returns the conflict raised by `existing`, a live object sharing an
/// identity with an object `deployment` intends to submit.
#[must_use]
pub fn conflict_for<M: ManagedObject>(existing: &M, deployment: &str) -> Option<DeployError> {
    match Ownership::of(existing.meta(), deployment) {
        Ownership::Owned => None,
        Ownership::Unmanaged => Some(DeployError::UnmanagedConflict {
            kind: M::KIND.as_str(),
            name: existing.name().to_string(),
        }),
        Ownership::Foreign(owner) => Some(DeployError::DeploymentConflict {
            kind: M::KIND.as_str(),
            name: existing.name().to_string(),
            deployment: owner.to_string(),
        }),
    }
}
