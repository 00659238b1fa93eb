//! JSON formatter.
//!
//! The machine format is a stable interface: one record per finding with
//! exactly `ruleId`, `severity`, `path`, `message` and `document`, plus
//! the run summary, parse failures and the completeness flag. Records
//! keep evaluation order (documents in input order, findings sorted by
//! path then rule id), so identical inputs render identical bytes.

use crate::document::ParseFailure;
use crate::runner::{RunReport, RunSummary};
use crate::types::Finding;
use serde::Serialize;

/// Format a run report as JSON.
pub fn format(report: &RunReport) -> String {
    let output = JsonOutput::from(report);
    serde_json::to_string_pretty(&output).unwrap_or_else(|_| "{}".to_string())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonOutput {
    findings: Vec<JsonFinding>,
    summary: RunSummary,
    parse_failures: Vec<ParseFailure>,
    complete: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonFinding {
    rule_id: String,
    severity: String,
    path: String,
    message: String,
    document: Option<JsonDocument>,
}

#[derive(Serialize)]
struct JsonDocument {
    kind: Option<String>,
    namespace: Option<String>,
    name: Option<String>,
}

impl From<&RunReport> for JsonOutput {
    fn from(report: &RunReport) -> Self {
        Self {
            findings: report
                .results
                .iter()
                .flat_map(|result| result.findings.iter())
                .map(JsonFinding::from)
                .collect(),
            summary: report.summary,
            parse_failures: report.parse_failures.clone(),
            complete: report.complete,
        }
    }
}

impl From<&Finding> for JsonFinding {
    fn from(finding: &Finding) -> Self {
        Self {
            rule_id: finding.rule_id.clone(),
            severity: finding.severity.to_string(),
            path: finding.path.to_string(),
            message: finding.message.clone(),
            document: finding.document.as_ref().map(|reference| JsonDocument {
                kind: reference.kind.clone(),
                namespace: reference.namespace.clone(),
                name: reference.name.clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConformityConfig;
    use crate::document::{SourceFormat, parse_content};
    use crate::evaluator::CancelToken;
    use crate::runner;

    fn report_for(content: &str) -> RunReport {
        let outcome = parse_content(content, SourceFormat::Yaml, "app.yaml");
        runner::execute(outcome, &ConformityConfig::default(), CancelToken::new()).unwrap()
    }

    #[test]
    fn test_record_shape() {
        let report = report_for(
            "kind: Pod\nmetadata:\n  name: web\n  namespace: prod\nspec:\n  containers:\n    - name: web\n      image: web:latest\n",
        );
        let value: serde_json::Value = serde_json::from_str(&format(&report)).unwrap();

        let findings = value["findings"].as_array().unwrap();
        assert!(!findings.is_empty());
        let record = findings[0].as_object().unwrap();
        let mut keys: Vec<&str> = record.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec!["document", "message", "path", "ruleId", "severity"]
        );
        assert_eq!(record["document"]["kind"], "Pod");
        assert_eq!(record["document"]["namespace"], "prod");
        assert_eq!(record["document"]["name"], "web");

        assert!(value["complete"].as_bool().unwrap());
        assert_eq!(value["summary"]["documents"], 1);
        assert!(value["parseFailures"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_identical_reports_render_identical_bytes() {
        let manifest = "kind: Pod\nmetadata:\n  name: web\nspec:\n  containers:\n    - name: a\n      image: a:latest\n    - name: b\n      image: b\n";
        let first = format(&report_for(manifest));
        let second = format(&report_for(manifest));
        assert_eq!(first, second);
    }

    #[test]
    fn test_parse_failures_serialized() {
        let report = report_for(": not yaml\n\t<<\n");
        let value: serde_json::Value = serde_json::from_str(&format(&report)).unwrap();
        let failures = value["parseFailures"].as_array().unwrap();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0]["origin"], "app.yaml");
        assert!(!failures[0]["message"].as_str().unwrap().is_empty());
        assert_eq!(value["summary"]["parseFailures"], 1);
    }
}
