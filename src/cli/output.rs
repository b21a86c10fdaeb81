//! Output formatting for CLI commands.
//!
//! This module renders plans, deployment listings and errors as text tables
//! or JSON, and provides [`TerminalUi`], the console surface deployers write
//! to while the CLI runs.

use colored::Colorize;
use serde::Serialize;
use std::fmt::Write as _;
use std::io::Write as _;
use std::sync::{Mutex, PoisonError};
use tabled::{Table, Tabled};

use crate::deploy::{DeployerError, DeploymentSummary};
use crate::planner::{ActionType, DeploymentPlan};
use crate::ui::{Ui, UiLevel};

use super::commands::OutputFormat;

/// Output formatter for CLI.
#[derive(Debug)]
pub struct OutputFormatter {
    /// Output format.
    format: OutputFormat,
}

/// Plan action row for table display.
#[derive(Tabled)]
struct PlanActionRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Object")]
    object: String,
    #[tabled(rename = "Template")]
    template: String,
    #[tabled(rename = "Changes")]
    changes: String,
}

/// Deployment row for table display.
#[derive(Tabled)]
struct DeploymentRow {
    #[tabled(rename = "Deployment")]
    deployment: String,
    #[tabled(rename = "Pack")]
    pack: String,
    #[tabled(rename = "Version")]
    version: String,
    #[tabled(rename = "Registry")]
    registry: String,
    #[tabled(rename = "Objects")]
    objects: String,
}

impl OutputFormatter {
    /// Creates a new output formatter.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Returns the output format.
    #[must_use]
    pub const fn format(&self) -> OutputFormat {
        self.format
    }

    /// Formats deployment plans for display.
    #[must_use]
    pub fn format_plans(&self, plans: &[&DeploymentPlan]) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(plans).unwrap_or_default(),
            OutputFormat::Text => plans
                .iter()
                .map(|plan| Self::format_plan_text(plan))
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    /// Formats one plan as a text table.
    #[must_use]
    pub fn format_plan_text(plan: &DeploymentPlan) -> String {
        if plan.actions.is_empty() {
            return format!("{} No {} templates to deploy.\n", "✓".green(), plan.kind);
        }

        let mut output = String::new();
        let _ = writeln!(output, "\nPlan for {}s in deployment '{}'\n", plan.kind, plan.deployment);

        let rows: Vec<PlanActionRow> = plan
            .actions
            .iter()
            .enumerate()
            .map(|(i, a)| PlanActionRow {
                index: i + 1,
                action: Self::format_action_type(a.action_type),
                object: if a.namespace.is_empty() {
                    a.name.clone()
                } else {
                    format!("{}/{}", a.namespace, a.name)
                },
                template: Self::truncate(&a.template, 40),
                changes: a.changed_fields.join(", "),
            })
            .collect();

        output.push_str(&Table::new(rows).to_string());
        output.push('\n');

        let _ = write!(
            output,
            "\nPlan: {} to create, {} to update, {} unchanged\n",
            plan.create_count().to_string().green(),
            plan.update_count().to_string().yellow(),
            plan.unchanged_count().to_string().dimmed()
        );

        output
    }

    /// Formats the deployments found in the cluster.
    #[must_use]
    pub fn format_status(&self, deployments: &[DeploymentSummary]) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(deployments).unwrap_or_default(),
            OutputFormat::Text => {
                if deployments.is_empty() {
                    return String::from("No pack deployments found.\n");
                }

                let rows: Vec<DeploymentRow> = deployments
                    .iter()
                    .map(|d| DeploymentRow {
                        deployment: d.deployment_name.clone(),
                        pack: d.pack_name.clone(),
                        version: d.pack_version.clone(),
                        registry: d.registry_name.clone(),
                        objects: d.objects.len().to_string(),
                    })
                    .collect();

                let mut output = Table::new(rows).to_string();
                output.push('\n');
                output
            }
        }
    }

    /// Formats stage errors for JSON output. Text output goes through
    /// [`Ui::error_with_context`] instead.
    #[must_use]
    pub fn format_errors(&self, errors: &[DeployerError]) -> String {
        let json: Vec<ErrorJson<'_>> = errors
            .iter()
            .map(|e| ErrorJson {
                subject: &e.subject,
                error: e.error.to_string(),
                context: e.context.iter().collect(),
            })
            .collect();
        serde_json::to_string_pretty(&json).unwrap_or_default()
    }

    /// Formats an action type with color.
    fn format_action_type(action_type: ActionType) -> String {
        match action_type {
            ActionType::Create => "+create".green().to_string(),
            ActionType::Update => "~update".yellow().to_string(),
            ActionType::NoChange => "unchanged".dimmed().to_string(),
        }
    }

    /// Truncates a string to a maximum number of characters.
    fn truncate(s: &str, max_len: usize) -> String {
        if s.chars().count() <= max_len {
            s.to_string()
        } else {
            let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
            format!("{kept}...")
        }
    }
}

#[derive(Serialize)]
struct ErrorJson<'a> {
    subject: &'a str,
    error: String,
    context: Vec<(&'a str, &'a str)>,
}

/// Console surface writing whole lines to stderr.
#[derive(Debug)]
pub struct TerminalUi {
    format: OutputFormat,
    lock: Mutex<()>,
}

impl TerminalUi {
    /// Creates a terminal surface for the given output format.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self {
            format,
            lock: Mutex::new(()),
        }
    }
}

impl Ui for TerminalUi {
    fn line(&self, level: UiLevel, message: &str) {
        let text = match level {
            UiLevel::Info | UiLevel::Output => message.to_string(),
            UiLevel::Success => format!("{} {message}", "✓".green()),
            UiLevel::Warning => format!("{} {message}", "⚠".yellow()),
            UiLevel::Error => format!("{} {message}", "✗".red()),
        };

        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(stderr, "{text}");
    }

    fn plan(&self, plan: &DeploymentPlan) {
        // JSON plans are printed together once every deployer has planned.
        if self.format == OutputFormat::Text {
            self.output(OutputFormatter::format_plan_text(plan).trim_end());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::{Job, ObjectId, ObjectKind};
    use crate::deploy::ErrorContext;
    use crate::error::{DeployError, PackError};
    use crate::planner::DiffEngine;
    use std::collections::BTreeMap;

    fn plan() -> DeploymentPlan {
        let diff = DiffEngine::new().compute_diff(
            &BTreeMap::from([(String::from("web.job.yaml"), Job::new("web"))]),
            &[],
        );
        DeploymentPlan::from_diff("web", ObjectKind::Job, &diff)
    }

    #[test]
    fn test_plan_text_lists_actions() {
        colored::control::set_override(false);
        let text = OutputFormatter::format_plan_text(&plan());

        assert!(text.contains("+create"));
        assert!(text.contains("web.job.yaml"));
        assert!(text.contains("Plan: 1 to create, 0 to update, 0 unchanged"));
    }

    #[test]
    fn test_plans_json() {
        let plan = plan();
        let json = OutputFormatter::new(OutputFormat::Json).format_plans(&[&plan]);
        let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");

        assert_eq!(value[0]["kind"], "job");
        assert_eq!(value[0]["actions"][0]["action_type"], "create");
    }

    #[test]
    fn test_status_table() {
        let summary = DeploymentSummary {
            deployment_name: String::from("web"),
            pack_name: String::from("nginx"),
            pack_version: String::from("1.2.0"),
            registry_name: String::from("community"),
            objects: vec![ObjectId {
                kind: ObjectKind::Job,
                namespace: String::from("default"),
                name: String::from("web"),
            }],
        };
        let text = OutputFormatter::new(OutputFormat::Text).format_status(&[summary]);
        assert!(text.contains("nginx"));
        assert!(text.contains("community"));

        let empty = OutputFormatter::new(OutputFormat::Text).format_status(&[]);
        assert_eq!(empty, "No pack deployments found.\n");
    }

    #[test]
    fn test_status_json() {
        let summary = DeploymentSummary {
            deployment_name: String::from("web"),
            pack_name: String::from("nginx"),
            pack_version: String::from("1.2.0"),
            registry_name: String::from("community"),
            objects: vec![ObjectId {
                kind: ObjectKind::Volume,
                namespace: String::from("team-a"),
                name: String::from("data"),
            }],
        };
        let json = OutputFormatter::new(OutputFormat::Json).format_status(&[summary]);
        let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");

        assert_eq!(value[0]["deployment_name"], "web");
        assert_eq!(value[0]["objects"][0]["kind"], "volume");
        assert_eq!(value[0]["objects"][0]["namespace"], "team-a");
        assert_eq!(value[0]["objects"][0]["name"], "data");
    }

    #[test]
    fn test_errors_json_carry_context() {
        let err = DeployerError::new(
            PackError::Deploy(DeployError::UnmanagedConflict {
                kind: "job",
                name: String::from("web"),
            }),
            "web.job.yaml",
            ErrorContext::new().with(ErrorContext::PACK, "nginx"),
        );
        let json = OutputFormatter::new(OutputFormat::Json).format_errors(&[err]);
        let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");

        assert_eq!(value[0]["subject"], "web.job.yaml");
        assert_eq!(value[0]["context"][0][0], "Pack");
        assert_eq!(value[0]["context"][0][1], "nginx");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(OutputFormatter::truncate("short", 10), "short");
        assert_eq!(OutputFormatter::truncate("a-very-long-template-name", 10), "a-very-...");
    }
}
