//! Deployment plan types and construction.
//!
//! This module converts a diff into the per-object actions a deploy would
//! perform.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cluster::ObjectKind;

use super::diff::{DiffResult, DiffType};

/// A deployment plan for one object kind.
#[derive(Debug, Clone, Serialize)]
pub struct DeploymentPlan {
    /// When the plan was created.
    pub created_at: DateTime<Utc>,
    /// Deployment the plan belongs to.
    pub deployment: String,
    /// Object kind covered by the plan.
    pub kind: ObjectKind,
    /// Planned actions, in submission order.
    pub actions: Vec<PlannedAction>,
}

/// A single planned action.
#[derive(Debug, Clone, Serialize)]
pub struct PlannedAction {
    /// Action type.
    pub action_type: ActionType,
    /// Template the object came from.
    pub template: String,
    /// Object namespace, empty for cluster-scoped kinds.
    pub namespace: String,
    /// Object name.
    pub name: String,
    /// Top-level fields that change.
    pub changed_fields: Vec<String>,
    /// Intended spec hash.
    pub new_hash: Option<String>,
}

/// Types of actions in a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionType {
    /// Create a new object.
    Create,
    /// Update an existing object in place.
    Update,
    /// Leave the object as it is.
    NoChange,
}

impl DeploymentPlan {
    /// Creates a plan from a diff result.
    #[must_use]
    pub fn from_diff(deployment: &str, kind: ObjectKind, diff: &DiffResult) -> Self {
        let actions = diff
            .diffs
            .iter()
            .map(|d| PlannedAction {
                action_type: match d.diff_type {
                    DiffType::Create => ActionType::Create,
                    DiffType::Update => ActionType::Update,
                    DiffType::NoChange => ActionType::NoChange,
                },
                template: d.template.clone(),
                namespace: d.id.namespace.clone(),
                name: d.id.name.clone(),
                changed_fields: d.details.iter().map(|detail| detail.field.clone()).collect(),
                new_hash: d.new_hash.clone(),
            })
            .collect();

        Self {
            created_at: Utc::now(),
            deployment: deployment.to_string(),
            kind,
            actions,
        }
    }

    /// Returns true if the plan changes nothing.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.actions
            .iter()
            .all(|a| a.action_type == ActionType::NoChange)
    }

    /// Returns the number of actions.
    #[must_use]
    pub const fn action_count(&self) -> usize {
        self.actions.len()
    }

    /// Returns the number of create actions.
    #[must_use]
    pub fn create_count(&self) -> usize {
        self.count(ActionType::Create)
    }

    /// Returns the number of update actions.
    #[must_use]
    pub fn update_count(&self) -> usize {
        self.count(ActionType::Update)
    }

    /// Returns the number of unchanged objects.
    #[must_use]
    pub fn unchanged_count(&self) -> usize {
        self.count(ActionType::NoChange)
    }

    fn count(&self, action_type: ActionType) -> usize {
        self.actions
            .iter()
            .filter(|a| a.action_type == action_type)
            .count()
    }
}

impl PlannedAction {
    /// Returns a human-readable description of the action.
    #[must_use]
    pub fn description(&self, kind: ObjectKind) -> String {
        match self.action_type {
            ActionType::Create => format!("Create {kind} '{}'", self.name),
            ActionType::Update => format!("Update {kind} '{}'", self.name),
            ActionType::NoChange => format!("No change for {kind} '{}'", self.name),
        }
    }
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::NoChange => "no change",
        };
        write!(f, "{s}")
    }
}

impl std::fmt::Display for PlannedAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} ({})", self.action_type, self.name, self.template)?;
        if !self.changed_fields.is_empty() {
            write!(f, " [{}]", self.changed_fields.join(", "))?;
        }
        Ok(())
    }
}

impl std::fmt::Display for DeploymentPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.actions.is_empty() {
            return write!(f, "No {} templates to deploy", self.kind);
        }

        writeln!(
            f,
            "Plan for {} {}s in deployment '{}': {} to create, {} to update, {} unchanged",
            self.actions.len(),
            self.kind,
            self.deployment,
            self.create_count(),
            self.update_count(),
            self.unchanged_count()
        )?;
        for (i, action) in self.actions.iter().enumerate() {
            writeln!(f, "  {}. {action}", i + 1)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::Job;
    use crate::planner::DiffEngine;
    use std::collections::BTreeMap;

    #[test]
    fn test_plan_from_diff() {
        let intended: BTreeMap<String, Job> = [
            (String::from("a.job.yaml"), Job::new("a")),
            (String::from("b.job.yaml"), Job::new("b").with_meta("v", "2")),
        ]
        .into_iter()
        .collect();
        let live = vec![Job::new("b").with_meta("v", "1")];

        let diff = DiffEngine::new().compute_diff(&intended, &live);
        let plan = DeploymentPlan::from_diff("web", ObjectKind::Job, &diff);

        assert_eq!(plan.action_count(), 2);
        assert_eq!(plan.create_count(), 1);
        assert_eq!(plan.update_count(), 1);
        assert!(!plan.is_noop());
        assert_eq!(plan.actions[1].changed_fields, vec![String::from("meta")]);
        assert_eq!(plan.actions[0].description(plan.kind), "Create job 'a'");
    }

    #[test]
    fn test_display_excludes_timestamp() {
        let diff = DiffEngine::new().compute_diff(
            &BTreeMap::from([(String::from("web.job.yaml"), Job::new("web"))]),
            &[Job::new("web")],
        );
        let first = DeploymentPlan::from_diff("web", ObjectKind::Job, &diff).to_string();
        let second = DeploymentPlan::from_diff("web", ObjectKind::Job, &diff).to_string();

        assert_eq!(first, second);
        assert!(first.contains("0 to create, 0 to update, 1 unchanged"));
    }

    #[test]
    fn test_empty_plan_display() {
        let plan = DeploymentPlan::from_diff("web", ObjectKind::Volume, &DiffResult::default());
        assert!(plan.is_noop());
        assert_eq!(plan.to_string(), "No volume templates to deploy");
    }
}
