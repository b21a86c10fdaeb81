//! Planning module for deployment operations.
//!
//! This module handles the comparison between intended and live objects,
//! producing the plan a deploy would carry out.

mod diff;
mod hash;
mod plan;

pub use diff::{DiffDetail, DiffEngine, DiffResult, DiffType, ResourceDiff};
pub use hash::SpecHasher;
pub use plan::{ActionType, DeploymentPlan, PlannedAction};
