//! Human-readable formatter.
//!
//! Findings are grouped under a per-document header and ordered severity
//! first so the worst problems top each group. Machine consumers should
//! use the JSON formatter; this layout is not a stable interface.

use crate::evaluator::EvaluationResult;
use crate::runner::RunReport;
use crate::types::{Finding, Severity};
use colored::{ColoredString, Colorize};

/// Format a run report as grouped text.
pub fn format(report: &RunReport) -> String {
    let mut output = String::new();

    for result in &report.results {
        if result.findings.is_empty() {
            continue;
        }
        output.push_str(&format!("{}\n", header(result).bold()));
        for finding in by_severity(result) {
            format_finding(&mut output, finding);
        }
        output.push('\n');
    }

    if !report.parse_failures.is_empty() {
        output.push_str(&format!("{}\n", "Parse failures".bold()));
        for failure in &report.parse_failures {
            output.push_str(&format!("  {} {}\n", tag(Severity::Error), failure));
        }
        output.push('\n');
    }

    if report.summary.findings == 0 && report.parse_failures.is_empty() {
        output.push_str("No conformance issues found.\n");
    }
    output.push_str(&summary_line(report));
    if !report.complete {
        output.push_str(&format!(
            "{}\n",
            "Run was cancelled; results are incomplete.".yellow()
        ));
    }

    output
}

fn header(result: &EvaluationResult) -> String {
    match &result.document {
        Some(reference) => format!("{} ({})", reference.describe(), reference.location()),
        None => "Across documents".to_string(),
    }
}

/// Display order: severity first (errors on top), then path, then rule id.
fn by_severity(result: &EvaluationResult) -> Vec<&Finding> {
    let mut findings: Vec<&Finding> = result.findings.iter().collect();
    findings.sort_by(|a, b| {
        b.severity
            .cmp(&a.severity)
            .then_with(|| a.path.cmp(&b.path))
            .then_with(|| a.rule_id.cmp(&b.rule_id))
    });
    findings
}

fn format_finding(output: &mut String, finding: &Finding) {
    if finding.path.is_root() {
        output.push_str(&format!(
            "  {} {} {}\n",
            tag(finding.severity),
            finding.rule_id.cyan(),
            finding.message,
        ));
    } else {
        output.push_str(&format!(
            "  {} {} at {}: {}\n",
            tag(finding.severity),
            finding.rule_id.cyan(),
            finding.path.to_string().dimmed(),
            finding.message,
        ));
    }
    if let Some(remediation) = &finding.remediation {
        output.push_str(&format!("      Remediation: {}\n", remediation.dimmed()));
    }
}

fn tag(severity: Severity) -> ColoredString {
    match severity {
        Severity::Error => "[ERROR]".red().bold(),
        Severity::Warning => "[WARNING]".yellow(),
        Severity::Info => "[INFO]".blue(),
    }
}

fn summary_line(report: &RunReport) -> String {
    let summary = &report.summary;
    let mut line = format!(
        "{} document(s) checked against {} rule(s): {} finding(s)",
        summary.documents, summary.rules, summary.findings,
    );
    if summary.findings > 0 {
        line.push_str(&format!(
            " ({} error(s), {} warning(s), {} info)",
            summary.errors, summary.warnings, summary.infos,
        ));
    }
    if summary.parse_failures > 0 {
        line.push_str(&format!(", {} parse failure(s)", summary.parse_failures));
    }
    line.push('\n');
    line
}
