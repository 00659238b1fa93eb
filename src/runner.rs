//! Run orchestration.
//!
//! Ties the layers together: instantiate the configured rule set, evaluate
//! the loaded documents, tally the summary, and map the outcome to a
//! process exit status.

use crate::config::ConformityConfig;
use crate::document::{DocumentSet, LoadOutcome, ParseFailure};
use crate::error::Result;
use crate::evaluator::{CancelToken, EvaluationResult, Evaluator};
use crate::rules::registry::RuleRegistry;
use crate::types::Severity;
use log::{info, warn};
use serde::Serialize;

/// Exit status meaning, kept in one place.
pub mod exit {
    /// No finding at or above the failure threshold.
    pub const OK: i32 = 0;
    /// At least one finding at or above the failure threshold.
    pub const FINDINGS: i32 = 1;
    /// Parse failures left nothing to evaluate.
    pub const NOTHING_PARSED: i32 = 2;
    /// Bad configuration or other startup failure.
    pub const STARTUP: i32 = 3;
}

/// Aggregate counts for the summary line and the machine format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    /// Documents that parsed and were evaluated.
    pub documents: usize,
    /// Active rules after configuration filtering.
    pub rules: usize,
    pub findings: usize,
    pub errors: usize,
    pub warnings: usize,
    pub infos: usize,
    pub parse_failures: usize,
}

impl RunSummary {
    fn tally(
        results: &[EvaluationResult],
        documents: usize,
        rules: usize,
        parse_failures: usize,
    ) -> Self {
        let mut errors = 0;
        let mut warnings = 0;
        let mut infos = 0;
        for finding in results.iter().flat_map(|result| result.findings.iter()) {
            match finding.severity {
                Severity::Error => errors += 1,
                Severity::Warning => warnings += 1,
                Severity::Info => infos += 1,
            }
        }
        Self {
            documents,
            rules,
            findings: errors + warnings + infos,
            errors,
            warnings,
            infos,
            parse_failures,
        }
    }
}

/// Everything one check run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Per-document results in input order, then the run-level result when
    /// it has findings.
    pub results: Vec<EvaluationResult>,
    pub parse_failures: Vec<ParseFailure>,
    /// False when cancellation cut the run short.
    pub complete: bool,
    pub summary: RunSummary,
}

impl RunReport {
    /// Whether any finding sits at or above the failure threshold.
    pub fn should_fail(&self, fail_on: Severity) -> bool {
        self.results
            .iter()
            .flat_map(|result| result.findings.iter())
            .any(|finding| finding.severity >= fail_on)
    }

    /// True when parse failures left nothing at all to evaluate. An empty
    /// input set with no failures is a clean run, not this.
    pub fn nothing_parsed(&self) -> bool {
        self.summary.documents == 0 && !self.parse_failures.is_empty()
    }

    /// Map this report to the documented process exit status.
    pub fn exit_code(&self, fail_on: Severity) -> i32 {
        if self.nothing_parsed() {
            exit::NOTHING_PARSED
        } else if self.should_fail(fail_on) {
            exit::FINDINGS
        } else {
            exit::OK
        }
    }
}

/// Evaluate the loaded documents against the configured rule set.
///
/// Parse failures ride along into the report; only startup problems
/// (bad rule references, pool construction) return an error here.
pub fn execute(
    outcome: LoadOutcome,
    config: &ConformityConfig,
    token: CancelToken,
) -> Result<RunReport> {
    let LoadOutcome {
        documents,
        failures,
    } = outcome;
    for failure in &failures {
        warn!("{}", failure);
    }

    let rules = RuleRegistry::builtin()?.instantiate(config)?;
    info!(
        "evaluating {} document(s) against {} rule(s)",
        documents.len(),
        rules.len()
    );

    let set = DocumentSet::new(documents);
    let mut evaluator = Evaluator::new(&rules).with_cancel_token(token);
    if let Some(workers) = config.concurrency {
        evaluator = evaluator.with_concurrency(workers)?;
    }
    let evaluation = evaluator.evaluate(&set);

    let summary = RunSummary::tally(&evaluation.results, set.len(), rules.len(), failures.len());
    Ok(RunReport {
        results: evaluation.results,
        parse_failures: failures,
        complete: evaluation.complete,
        summary,
    })
}
