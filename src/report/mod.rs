//! Report rendering.

pub mod human;
pub mod json;

use crate::runner::RunReport;

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    /// Grouped, human-oriented text.
    #[default]
    Human,
    /// Stable machine-readable JSON.
    Json,
}

impl ReportFormat {
    /// Parse from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "human" | "text" => Some(Self::Human),
            "json" | "machine" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Render a report to a string.
pub fn render(report: &RunReport, format: ReportFormat) -> String {
    match format {
        ReportFormat::Human => human::format(report),
        ReportFormat::Json => json::format(report),
    }
}
