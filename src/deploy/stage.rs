//! Deployer lifecycle stages.

use serde::Serialize;

/// Where a deployer is in its lifecycle.
///
/// Stages only move forward. Conflict checks and plans may repeat once the
/// templates are canonicalized; destruction is reachable as soon as a
/// deployment config is bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    /// No deployment config bound yet.
    Unconfigured,
    /// Config bound, awaiting templates.
    Bound,
    /// Config and templates supplied.
    Configured,
    /// Templates decoded.
    Parsed,
    /// Parsed objects normalized.
    Canonicalized,
    /// Checked against running objects.
    ConflictChecked,
    /// Plan printed.
    Planned,
    /// Objects submitted to the cluster.
    Deployed,
    /// Deployment removed from the cluster.
    Destroyed,
}

/// Operations that drive a deployer between stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Bind the deployment config.
    SetConfig,
    /// Supply rendered templates.
    SetTemplates,
    /// Decode templates.
    Parse,
    /// Normalize parsed objects.
    Canonicalize,
    /// Check for conflicting objects.
    CheckConflicts,
    /// Print a plan.
    Plan,
    /// Submit objects.
    Deploy,
    /// Remove the deployment.
    Destroy,
}

impl Stage {
    /// Returns the stage name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unconfigured => "unconfigured",
            Self::Bound => "awaiting templates",
            Self::Configured => "configured",
            Self::Parsed => "parsed",
            Self::Canonicalized => "canonicalized",
            Self::ConflictChecked => "conflict-checked",
            Self::Planned => "planned",
            Self::Deployed => "deployed",
            Self::Destroyed => "destroyed",
        }
    }

    /// Returns true if `operation` may run in this stage.
    #[must_use]
    pub const fn permits(self, operation: Operation) -> bool {
        match operation {
            Operation::SetConfig => matches!(self, Self::Unconfigured),
            Operation::SetTemplates => matches!(self, Self::Bound),
            Operation::Parse => matches!(self, Self::Configured),
            Operation::Canonicalize => matches!(self, Self::Parsed),
            Operation::CheckConflicts | Operation::Plan | Operation::Deploy => matches!(
                self,
                Self::Canonicalized | Self::ConflictChecked | Self::Planned
            ),
            Operation::Destroy => !matches!(self, Self::Unconfigured | Self::Destroyed),
        }
    }

    /// Stage reached after `operation` completes from this stage.
    #[must_use]
    pub fn after(self, operation: Operation) -> Self {
        let reached = match operation {
            Operation::SetConfig => Self::Bound,
            Operation::SetTemplates => Self::Configured,
            Operation::Parse => Self::Parsed,
            Operation::Canonicalize => Self::Canonicalized,
            Operation::CheckConflicts => Self::ConflictChecked,
            Operation::Plan => Self::Planned,
            Operation::Deploy => Self::Deployed,
            Operation::Destroy => Self::Destroyed,
        };
        self.max(reached)
    }
}

impl Operation {
    /// Returns a human-readable name for the operation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SetConfig => "set deployment config",
            Self::SetTemplates => "set templates",
            Self::Parse => "parse templates",
            Self::Canonicalize => "canonicalize templates",
            Self::CheckConflicts => "check for conflicts",
            Self::Plan => "plan deployment",
            Self::Deploy => "deploy",
            Self::Destroy => "destroy deployment",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        let mut stage = Stage::Unconfigured;
        for op in [
            Operation::SetConfig,
            Operation::SetTemplates,
            Operation::Parse,
            Operation::Canonicalize,
            Operation::CheckConflicts,
            Operation::Plan,
            Operation::Deploy,
        ] {
            assert!(stage.permits(op), "{op:?} rejected in {stage}");
            stage = stage.after(op);
        }
        assert_eq!(stage, Stage::Deployed);
    }

    #[test]
    fn test_out_of_order_rejected() {
        assert!(!Stage::Configured.permits(Operation::Canonicalize));
        assert!(!Stage::Parsed.permits(Operation::Deploy));
        assert!(!Stage::Parsed.permits(Operation::CheckConflicts));
        assert!(!Stage::Canonicalized.permits(Operation::Parse));
        assert!(!Stage::Deployed.permits(Operation::Deploy));
        assert!(!Stage::Bound.permits(Operation::Parse));
    }

    #[test]
    fn test_plan_and_conflicts_repeatable_without_regressing() {
        let planned = Stage::Canonicalized.after(Operation::Plan);
        assert!(planned.permits(Operation::CheckConflicts));
        assert_eq!(planned.after(Operation::CheckConflicts), Stage::Planned);
        assert!(planned.permits(Operation::Plan));
    }

    #[test]
    fn test_destroy_reachable_without_templates() {
        assert!(Stage::Bound.permits(Operation::Destroy));
        assert!(Stage::Deployed.permits(Operation::Destroy));
        assert!(!Stage::Unconfigured.permits(Operation::Destroy));
        assert!(!Stage::Destroyed.permits(Operation::Destroy));
    }
}
