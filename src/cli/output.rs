//! Output formatting for CLI commands.
//!
//! Results are rendered either as a coloured summary with a change table
//! or as the JSON result document.

use colored::Colorize;
use std::fmt::Write;
use tabled::{Table, Tabled};

use crate::config::ValidationResult;
use crate::error::MicetroError;
use crate::planner::{DiffDetail, ReconcileAction};
use crate::reconciler::ReconciliationResult;
use crate::runner::failure_document;

use super::commands::OutputFormat;

/// Output formatter for CLI.
#[derive(Debug)]
pub struct OutputFormatter {
    /// Output format.
    format: OutputFormat,
}

/// Change row for table display.
#[derive(Tabled)]
struct ChangeRow {
    #[tabled(rename = "")]
    marker: String,
    #[tabled(rename = "Field")]
    field: String,
    #[tabled(rename = "Current")]
    current: String,
    #[tabled(rename = "Desired")]
    desired: String,
}

impl OutputFormatter {
    /// Creates a new output formatter.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a reconciliation result for display.
    #[must_use]
    pub fn format_result(&self, result: &ReconciliationResult) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(result).unwrap_or_default(),
            OutputFormat::Text => Self::format_result_text(result),
        }
    }

    fn format_result_text(result: &ReconciliationResult) -> String {
        let mut output = String::new();

        let status = if result.changed {
            Self::format_action(result.action)
        } else {
            "ok".green().to_string()
        };
        let _ = writeln!(output, "{status}: {}", result.message);

        if !result.diff.is_empty() {
            let rows: Vec<ChangeRow> = result.diff.iter().map(ChangeRow::from).collect();
            output.push_str(&Table::new(rows).to_string());
            output.push('\n');
        }

        for warning in &result.warnings {
            let _ = writeln!(output, "{} {warning}", "warning:".yellow());
        }
        for error in &result.errors {
            let _ = writeln!(output, "{} {error}", "failed:".red());
        }

        output
    }

    /// Formats a failed invocation.
    #[must_use]
    pub fn format_failure(&self, err: &MicetroError) -> String {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(&failure_document(err)).unwrap_or_default()
            }
            OutputFormat::Text => format!("{} {err}", "error:".red().bold()),
        }
    }

    /// Formats the outcome of parameter validation.
    #[must_use]
    pub fn format_validation(&self, name: &str, result: &ValidationResult) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(&serde_json::json!({
                "valid": result.is_valid(),
                "name": name,
                "warnings": result.warnings,
            }))
            .unwrap_or_default(),
            OutputFormat::Text => {
                let mut output = format!("{} Parameters for '{name}' are valid\n", "✓".green());
                for warning in &result.warnings {
                    let _ = writeln!(output, "  {} {warning}", "⚠".yellow());
                }
                output
            }
        }
    }

    fn format_action(action: ReconcileAction) -> String {
        match action {
            ReconcileAction::Create => "create".green().to_string(),
            ReconcileAction::Update => "update".yellow().to_string(),
            ReconcileAction::Delete => "delete".red().to_string(),
            ReconcileAction::Noop => "noop".dimmed().to_string(),
        }
    }

    fn truncate(s: &str, max_len: usize) -> String {
        if s.chars().count() <= max_len {
            s.to_string()
        } else {
            let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
            format!("{kept}...")
        }
    }
}

impl From<&DiffDetail> for ChangeRow {
    fn from(detail: &DiffDetail) -> Self {
        let marker = match (&detail.old_value, &detail.new_value) {
            (None, Some(_)) => "+",
            (Some(_), None) => "-",
            _ => "~",
        };
        Self {
            marker: marker.to_string(),
            field: detail.field.clone(),
            current: OutputFormatter::truncate(detail.old_value.as_deref().unwrap_or(""), 40),
            desired: OutputFormatter::truncate(detail.new_value.as_deref().unwrap_or(""), 40),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::reconciler::ItemError;
    use serde_json::json;

    fn result() -> ReconciliationResult {
        ReconciliationResult {
            changed: true,
            action: ReconcileAction::Create,
            planned: false,
            resource: json!({"name": "local"}),
            errors: vec![ItemError {
                item: String::from("neverheardof"),
                message: String::from("User 'neverheardof' does not exist"),
            }],
            warnings: vec![],
            diff: vec![DiffDetail {
                field: String::from("users"),
                old_value: None,
                new_value: Some(String::from("johndoe")),
            }],
            message: String::from("Create group 'local'"),
        }
    }

    #[test]
    fn test_json_result_document() {
        let formatter = OutputFormatter::new(OutputFormat::Json);
        let doc: serde_json::Value =
            serde_json::from_str(&formatter.format_result(&result())).unwrap();
        assert_eq!(doc["changed"], true);
        assert_eq!(doc["action"], "create");
        assert_eq!(doc["errors"][0]["item"], "neverheardof");
        assert!(doc.get("warnings").is_none());
        assert!(doc.get("planned").is_none());
    }

    #[test]
    fn test_text_result_lists_changes() {
        colored::control::set_override(false);
        let formatter = OutputFormatter::new(OutputFormat::Text);
        let text = formatter.format_result(&result());
        assert!(text.starts_with("create: Create group 'local'"));
        assert!(text.contains("johndoe"));
        assert!(text.contains("failed: neverheardof"));
    }

    #[test]
    fn test_json_failure_document() {
        let formatter = OutputFormatter::new(OutputFormat::Json);
        let err: MicetroError = ApiError::transport("operation timed out").into();
        let doc: serde_json::Value =
            serde_json::from_str(&formatter.format_failure(&err)).unwrap();
        assert_eq!(doc["failed"], true);
        assert_eq!(doc["kind"], "transport");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(OutputFormatter::truncate("short", 40), "short");
        assert_eq!(OutputFormatter::truncate("abcdefghij", 6), "abc...");
    }
}
