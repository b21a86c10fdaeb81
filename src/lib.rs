// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![forbid(unsafe_code)]               // Unsafe code is forbidden
#![warn(missing_docs)]                // All public items must be documented
#![warn(dead_code)]                   // Unused code is flagged
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention

// Additional strictness
#![warn(unused_imports)]              // Unused imports are flagged
#![warn(unused_variables)]            // Unused variables are flagged
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::unwrap_in_result)]    // unwrap() in Result warning
#![warn(clippy::redundant_clone)]     // Useless clones warning
#![warn(clippy::too_many_arguments)]  // Limit function arguments
#![warn(clippy::cognitive_complexity)] // Limit cognitive complexity

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// ============================================================================
// Crate Documentation
// ============================================================================

//! # Pack Deploy
//!
//! Deploys rendered pack templates to a cluster and tracks which objects
//! belong to which pack deployment.
//!
//! ## Overview
//!
//! A pack is rendered into one template per object (jobs, volumes and
//! namespaces). For each object kind a [`deploy::Deployer`] takes those
//! templates through a fixed lifecycle:
//!
//! 1. **Bind**: attach the immutable [`config::DeploymentConfig`]
//! 2. **Parse**: decode every template into a typed object
//! 3. **Canonicalize**: normalize and reject invalid or duplicate objects
//! 4. **Check conflicts**: refuse to overwrite objects another deployment
//!    or an operator owns
//! 5. **Plan**: report what a deploy would create or update
//! 6. **Deploy**: stamp provenance metadata and submit to the cluster
//!
//! Destroy removes every object whose provenance names this deployment.
//!
//! ## Modules
//!
//! - [`cluster`]: object kinds, the cluster API trait and its backends
//! - [`config`]: deployment and driver configuration
//! - [`templates`]: rendered template sets
//! - [`deploy`]: per-kind deployers and the driver running them
//! - [`planner`]: diffing intended against live objects
//! - [`ui`]: user-facing message surface
//! - [`cli`]: command-line interface
//!
//! ## Example
//!
//! ```yaml
//! cluster:
//!   address: http://127.0.0.1:4646
//! deployment:
//!   name: web
//!   pack: nginx
//!   path: ./packs/nginx
//!   version: 1.2.0
//!   registry: community
//! templates: rendered
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod cli;
pub mod cluster;
pub mod config;
pub mod deploy;
pub mod error;
pub mod planner;
pub mod templates;
pub mod ui;

// ============================================================================
// Re-exports
// ============================================================================

pub use cli::{Cli, Commands, OutputFormatter};
pub use cluster::{ClusterClient, HttpClusterClient, MemoryCluster, ObjectKind};
pub use config::{ConfigParser, ConfigValidator, DeploymentConfig, DriverConfig};
pub use deploy::{Deployer, DeployerError, DeploymentDriver, JobDeployer, NamespaceDeployer, VolumeDeployer};
pub use error::{PackError, Result};
pub use planner::{DeploymentPlan, DiffEngine};
pub use templates::Templates;
pub use ui::{RecordingUi, Ui};
