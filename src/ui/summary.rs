//! End-of-run summary on stdout
//!
//! Human readable by default, a single JSON document with `--json`.

use std::path::PathBuf;

use console::Style;
use serde::Serialize;

use crate::domain::{ApplicationType, Platform};
use crate::error::Result;

/// What happened to the launch step
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LaunchReport {
    Launched { pid: u32, target: PathBuf },
    Skipped,
    Failed { error: String },
}

/// Facts about one completed update
#[derive(Debug, Clone, Serialize)]
pub struct UpdateSummary {
    pub version: &'static str,
    pub platform: Platform,
    pub pid: u32,
    pub current_path: PathBuf,
    pub new_path: PathBuf,
    pub current_type: ApplicationType,
    pub new_type: ApplicationType,
    pub strategy: &'static str,
    pub backup_name: String,
    pub backup_removed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
    pub launch: LaunchReport,
}

/// Turns a summary into printable text
pub trait SummaryFormatter {
    fn render(&self, summary: &UpdateSummary) -> Result<String>;
}

/// Styled multi-line text
pub struct HumanFormatter;

impl SummaryFormatter for HumanFormatter {
    fn render(&self, summary: &UpdateSummary) -> Result<String> {
        let label = Style::new().bold();
        let mut lines = vec![
            Style::new()
                .bold()
                .green()
                .apply_to("Update complete")
                .to_string(),
            format!(
                "  {} {}",
                label.apply_to("Application:"),
                summary.current_path.display()
            ),
            format!(
                "  {} {}",
                label.apply_to("Installed from:"),
                summary.new_path.display()
            ),
            format!(
                "  {} {} -> {} ({} walk)",
                label.apply_to("Type:"),
                summary.current_type,
                summary.new_type,
                summary.strategy
            ),
        ];

        if let Some(checksum) = &summary.checksum {
            lines.push(format!("  {} {checksum}", label.apply_to("Checksum:")));
        }

        if !summary.backup_removed {
            lines.push(format!(
                "  {} backup {} could not be removed",
                Style::new().yellow().apply_to("Warning:"),
                summary.current_path.join(&summary.backup_name).display()
            ));
        }

        let launch = match &summary.launch {
            LaunchReport::Launched { pid, target } => format!(
                "{} (PID {pid})",
                Style::new().cyan().apply_to(target.display())
            ),
            LaunchReport::Skipped => "skipped".to_string(),
            LaunchReport::Failed { error } => {
                format!("{} {error}", Style::new().yellow().apply_to("failed:"))
            }
        };
        lines.push(format!("  {} {launch}", label.apply_to("Launch:")));

        Ok(lines.join("\n"))
    }
}

/// Pretty-printed JSON
pub struct JsonFormatter;

impl SummaryFormatter for JsonFormatter {
    fn render(&self, summary: &UpdateSummary) -> Result<String> {
        Ok(serde_json::to_string_pretty(summary)?)
    }
}

/// Print `summary` to stdout
pub fn print(summary: &UpdateSummary, json: bool) -> Result<()> {
    let text = if json {
        JsonFormatter.render(summary)?
    } else {
        HumanFormatter.render(summary)?
    };
    println!("{text}");
    Ok(())
}
