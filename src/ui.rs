//! Console surface used by deployers.
//!
//! Deployers report progress through [`Ui`] while they run, independent of
//! the errors they return. Implementations are shared between concurrently
//! running deployers and must write whole lines.

use std::sync::{Mutex, PoisonError};

use crate::deploy::DeployerError;
use crate::planner::DeploymentPlan;

/// Severity of a console line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UiLevel {
    /// Progress information.
    Info,
    /// A step completed.
    Success,
    /// Something non-fatal went wrong.
    Warning,
    /// Something failed.
    Error,
    /// Plain output such as plans.
    Output,
}

/// Console surface.
pub trait Ui: Send + Sync {
    /// Writes one line at `level`.
    fn line(&self, level: UiLevel, message: &str);

    /// Writes an informational line.
    fn info(&self, message: &str) {
        self.line(UiLevel::Info, message);
    }

    /// Writes a success line.
    fn success(&self, message: &str) {
        self.line(UiLevel::Success, message);
    }

    /// Writes a warning line.
    fn warning(&self, message: &str) {
        self.line(UiLevel::Warning, message);
    }

    /// Writes an error line.
    fn error(&self, message: &str) {
        self.line(UiLevel::Error, message);
    }

    /// Writes plain output.
    fn output(&self, message: &str) {
        self.line(UiLevel::Output, message);
    }

    /// Renders a deployment plan.
    fn plan(&self, plan: &DeploymentPlan) {
        self.output(plan.to_string().trim_end());
    }

    /// Renders an error with its subject and context lines.
    fn error_with_context(&self, err: &DeployerError) {
        self.error(&err.error.to_string());
        self.output(&format!("  Subject: {}", err.subject));
        for (key, value) in err.context.iter() {
            self.output(&format!("  - {key}: {value}"));
        }
    }
}

/// A recorded console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiLine {
    /// Line severity.
    pub level: UiLevel,
    /// Line text.
    pub text: String,
}

/// Console surface that keeps every line in memory.
#[derive(Debug, Default)]
pub struct RecordingUi {
    lines: Mutex<Vec<UiLine>>,
}

impl RecordingUi {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every recorded line, in order.
    #[must_use]
    pub fn lines(&self) -> Vec<UiLine> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the text of lines at `level`.
    #[must_use]
    pub fn texts(&self, level: UiLevel) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|l| l.level == level)
            .map(|l| l.text)
            .collect()
    }

    /// Returns true if any line contains `needle`.
    #[must_use]
    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|l| l.text.contains(needle))
    }

    /// Forgets every recorded line.
    pub fn clear(&self) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Ui for RecordingUi {
    fn line(&self, level: UiLevel, message: &str) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(UiLine {
                level,
                text: message.to_string(),
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deploy::ErrorContext;
    use crate::error::{PackError, TemplateError};

    #[test]
    fn test_records_levels_in_order() {
        let ui = RecordingUi::new();
        ui.info("one");
        ui.warning("two");
        ui.success("three");

        let lines = ui.lines();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1].level, UiLevel::Warning);
        assert_eq!(ui.texts(UiLevel::Success), vec![String::from("three")]);

        ui.clear();
        assert!(ui.lines().is_empty());
    }

    #[test]
    fn test_error_with_context() {
        let ui = RecordingUi::new();
        let err = DeployerError::new(
            PackError::from(TemplateError::Parse {
                message: String::from("bad indent"),
            }),
            "job.tmpl",
            ErrorContext::new()
                .with(ErrorContext::PACK, "nginx")
                .with(ErrorContext::TEMPLATE, "job.tmpl"),
        );

        ui.error_with_context(&err);

        let lines = ui.lines();
        assert_eq!(lines[0].level, UiLevel::Error);
        assert!(lines[0].text.contains("bad indent"));
        assert_eq!(lines[1].text, "  Subject: job.tmpl");
        assert_eq!(lines[2].text, "  - Pack: nginx");
        assert_eq!(lines[3].text, "  - Template: job.tmpl");
    }
}
