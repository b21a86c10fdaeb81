//! Diff engine for comparing intended vs live objects.
//!
//! This module computes the difference between the objects a deployer is
//! about to submit and the objects already running in the cluster.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

use crate::cluster::{ManagedObject, ObjectId};

use super::hash::SpecHasher;

/// Engine for computing diffs between intended and live objects.
#[derive(Debug, Default)]
pub struct DiffEngine {
    /// Spec hasher.
    hasher: SpecHasher,
}

/// Difference for a single object.
#[derive(Debug, Clone)]
pub struct ResourceDiff {
    /// Template the object came from.
    pub template: String,
    /// Object identity.
    pub id: ObjectId,
    /// Type of difference.
    pub diff_type: DiffType,
    /// Details about the difference.
    pub details: Vec<DiffDetail>,
    /// Live hash (if the object exists).
    pub old_hash: Option<String>,
    /// Intended hash.
    pub new_hash: Option<String>,
}

/// Type of difference detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffType {
    /// Object needs to be created.
    Create,
    /// Object exists and differs.
    Update,
    /// Object is unchanged.
    NoChange,
}

/// Detail about a specific difference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffDetail {
    /// Top-level field that differs.
    pub field: String,
    /// Live value, as compact JSON.
    pub old_value: Option<String>,
    /// Intended value, as compact JSON.
    pub new_value: Option<String>,
}

/// Complete diff result.
#[derive(Debug, Default)]
pub struct DiffResult {
    /// All object diffs, in template name order.
    pub diffs: Vec<ResourceDiff>,
    /// Number of objects to create.
    pub creates: usize,
    /// Number of objects to update.
    pub updates: usize,
    /// Number of unchanged objects.
    pub unchanged: usize,
}

impl DiffEngine {
    /// Creates a new diff engine.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            hasher: SpecHasher::new(),
        }
    }

    /// Computes the diff between intended objects (keyed by template) and
    /// live objects of the same kind.
    pub fn compute_diff<M: ManagedObject>(
        &self,
        intended: &BTreeMap<String, M>,
        live: &[M],
    ) -> DiffResult {
        let live_by_id: HashMap<ObjectId, &M> = live.iter().map(|o| (o.id(), o)).collect();

        let diffs: Vec<ResourceDiff> = intended
            .iter()
            .map(|(template, object)| {
                self.compute_object_diff(template, object, live_by_id.get(&object.id()).copied())
            })
            .collect();

        let creates = diffs.iter().filter(|d| d.diff_type == DiffType::Create).count();
        let updates = diffs.iter().filter(|d| d.diff_type == DiffType::Update).count();
        let unchanged = diffs.iter().filter(|d| d.diff_type == DiffType::NoChange).count();

        DiffResult {
            diffs,
            creates,
            updates,
            unchanged,
        }
    }

    fn compute_object_diff<M: ManagedObject>(
        &self,
        template: &str,
        intended: &M,
        live: Option<&M>,
    ) -> ResourceDiff {
        let id = intended.id();
        let new_hash = self.hasher.hash_object(intended);

        let Some(live) = live else {
            debug!("{id} needs to be created");
            return ResourceDiff {
                template: template.to_string(),
                id,
                diff_type: DiffType::Create,
                details: vec![],
                old_hash: None,
                new_hash,
            };
        };

        let old_hash = self.hasher.hash_object(live);
        let unchanged = match (&old_hash, &new_hash) {
            (Some(old), Some(new)) => SpecHasher::hashes_match(old, new),
            _ => false,
        };

        if unchanged {
            debug!("{id} is up to date");
            ResourceDiff {
                template: template.to_string(),
                id,
                diff_type: DiffType::NoChange,
                details: vec![],
                old_hash,
                new_hash,
            }
        } else {
            debug!("{id} needs update");
            ResourceDiff {
                template: template.to_string(),
                id,
                diff_type: DiffType::Update,
                details: Self::compute_detailed_diff(live, intended),
                old_hash,
                new_hash,
            }
        }
    }

    /// Lists the top-level fields whose values differ.
    fn compute_detailed_diff<M: ManagedObject>(live: &M, intended: &M) -> Vec<DiffDetail> {
        let (Ok(old), Ok(new)) = (serde_json::to_value(live), serde_json::to_value(intended))
        else {
            return vec![];
        };
        let (Some(old), Some(new)) = (old.as_object(), new.as_object()) else {
            return vec![];
        };

        let fields: BTreeSet<&String> = old.keys().chain(new.keys()).collect();
        fields
            .into_iter()
            .filter(|field| old.get(*field) != new.get(*field))
            .map(|field| DiffDetail {
                field: field.clone(),
                old_value: old.get(field).map(ToString::to_string),
                new_value: new.get(field).map(ToString::to_string),
            })
            .collect()
    }
}

impl DiffResult {
    /// Returns true if there are any changes.
    #[must_use]
    pub const fn has_changes(&self) -> bool {
        self.creates > 0 || self.updates > 0
    }

    /// Returns the total number of changes.
    #[must_use]
    pub const fn total_changes(&self) -> usize {
        self.creates + self.updates
    }

    /// Filters to only diffs that require action.
    #[must_use]
    pub fn actionable_diffs(&self) -> Vec<&ResourceDiff> {
        self.diffs
            .iter()
            .filter(|d| d.diff_type != DiffType::NoChange)
            .collect()
    }
}

impl std::fmt::Display for DiffType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::NoChange => "no change",
        };
        write!(f, "{s}")
    }
}

impl std::fmt::Display for ResourceDiff {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.id, self.diff_type)?;
        if !self.details.is_empty() {
            write!(f, " (")?;
            for (i, detail) in self.details.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", detail.field)?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::Job;

    fn intended(jobs: &[Job]) -> BTreeMap<String, Job> {
        jobs.iter()
            .map(|j| (format!("{}.job.yaml", j.name), j.clone()))
            .collect()
    }

    #[test]
    fn test_create_update_nochange() {
        let engine = DiffEngine::new();
        let want = intended(&[
            Job::new("new"),
            Job::new("same").with_meta("team", "a"),
            Job::new("changed").with_meta("team", "b"),
        ]);
        let live = vec![
            Job::new("same").with_meta("team", "a"),
            Job::new("changed").with_meta("team", "a"),
        ];

        let result = engine.compute_diff(&want, &live);
        assert_eq!(result.creates, 1);
        assert_eq!(result.updates, 1);
        assert_eq!(result.unchanged, 1);
        assert!(result.has_changes());
        assert_eq!(result.actionable_diffs().len(), 2);

        let changed = result
            .diffs
            .iter()
            .find(|d| d.id.name == "changed")
            .expect("changed diff");
        assert_eq!(changed.details.len(), 1);
        assert_eq!(changed.details[0].field, "meta");
        assert_eq!(changed.to_string(), "job 'default/changed': update (meta)");
    }

    #[test]
    fn test_namespace_is_part_of_identity() {
        let engine = DiffEngine::new();
        let want = intended(&[Job::new("web").with_namespace("apps")]);
        let live = vec![Job::new("web")];

        let result = engine.compute_diff(&want, &live);
        assert_eq!(result.creates, 1);
    }

    #[test]
    fn test_no_changes() {
        let engine = DiffEngine::new();
        let result = engine.compute_diff(&intended(&[Job::new("web")]), &[Job::new("web")]);
        assert!(!result.has_changes());
        assert_eq!(result.total_changes(), 0);
    }
}
