//! Rule evaluation.
//!
//! The evaluator expands the active rule set against a document set into
//! (document, rule) tasks and runs them on a rayon worker pool. Rules are
//! fault-isolated: a panicking rule becomes an Error-severity `INTERNAL`
//! finding instead of taking the run down. Workers only append to
//! per-document buckets and every bucket is sorted afterwards, so the
//! output is deterministic no matter how the pool schedules work.

use crate::document::{DocumentId, DocumentRef, DocumentSet, Path};
use crate::error::Result;
use crate::rules::CheckImpl;
use crate::rules::registry::{ActiveRule, RuleSet};
use crate::types::{Finding, INTERNAL_RULE_ID, Severity, Violation};
use crate::waiver;
use log::{debug, warn};
use rayon::prelude::*;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cooperative cancellation flag.
///
/// Once cancelled, in-flight rule evaluations finish but no new
/// (document, rule) pair starts, and the evaluation reports itself
/// incomplete.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// The outcome for one evaluation target.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationResult {
    /// The document this result covers, or `None` for the synthetic
    /// run-level result that collects unattributed cross-document
    /// findings.
    pub document: Option<DocumentRef>,
    /// Findings sorted by (path, rule id).
    pub findings: Vec<Finding>,
    /// True iff no finding has Error severity. Independent of the
    /// configured failure threshold, which only shapes the exit code.
    pub passed: bool,
}

/// Everything one evaluation produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// One result per input document, in input order, then the run-level
    /// result when it has findings.
    pub results: Vec<EvaluationResult>,
    /// False when cancellation kept pairs from being scheduled.
    pub complete: bool,
}

impl Evaluation {
    /// Highest severity across all findings.
    pub fn max_severity(&self) -> Option<Severity> {
        self.results
            .iter()
            .flat_map(|result| result.findings.iter())
            .map(|finding| finding.severity)
            .max()
    }

    /// Total number of findings.
    pub fn finding_count(&self) -> usize {
        self.results.iter().map(|result| result.findings.len()).sum()
    }
}

enum Task<'s> {
    Doc { id: DocumentId, active: &'s ActiveRule },
    Set { active: &'s ActiveRule },
}

/// Applies a rule set to documents.
pub struct Evaluator<'a> {
    rules: &'a RuleSet,
    token: CancelToken,
    pool: Option<rayon::ThreadPool>,
}

impl<'a> Evaluator<'a> {
    pub fn new(rules: &'a RuleSet) -> Self {
        Self {
            rules,
            token: CancelToken::new(),
            pool: None,
        }
    }

    /// Share a cancellation token with the caller.
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.token = token;
        self
    }

    /// Bound evaluation to a dedicated pool of `workers` threads instead
    /// of the global rayon pool.
    pub fn with_concurrency(mut self, workers: usize) -> Result<Self> {
        self.pool = Some(
            rayon::ThreadPoolBuilder::new()
                .num_threads(workers)
                .build()?,
        );
        Ok(self)
    }

    /// Evaluate every applicable rule against every document.
    pub fn evaluate(&self, set: &DocumentSet) -> Evaluation {
        let mut tasks: Vec<Task> = Vec::new();
        for active in self.rules.document_rules() {
            for (id, document) in set.iter() {
                if !active.rule.applies(document) {
                    continue;
                }
                if waiver::is_waived(document, active.rule.id) {
                    debug!(
                        "rule {} waived on {}",
                        active.rule.id,
                        document.reference()
                    );
                    continue;
                }
                tasks.push(Task::Doc { id, active });
            }
        }
        for active in self.rules.set_rules() {
            tasks.push(Task::Set { active });
        }
        debug!(
            "evaluating {} task(s) across {} document(s)",
            tasks.len(),
            set.len()
        );

        let collect = || -> Vec<(Option<DocumentId>, Finding)> {
            tasks
                .par_iter()
                .flat_map_iter(|task| self.run_task(task, set))
                .collect()
        };
        let raw = match &self.pool {
            Some(pool) => pool.install(collect),
            None => collect(),
        };

        // Order-independent aggregation: bucket by document, then sort.
        // A target id outside the set (a rule bug) degrades to run-level.
        let mut per_document: Vec<Vec<Finding>> = vec![Vec::new(); set.len()];
        let mut run_level: Vec<Finding> = Vec::new();
        for (target, finding) in raw {
            match target.and_then(|id| per_document.get_mut(id.0)) {
                Some(bucket) => bucket.push(finding),
                None => run_level.push(finding),
            }
        }

        let mut results = Vec::with_capacity(set.len() + 1);
        for (id, document) in set.iter() {
            let mut findings = std::mem::take(&mut per_document[id.0]);
            findings.sort();
            results.push(EvaluationResult {
                document: Some(document.reference().clone()),
                passed: passed(&findings),
                findings,
            });
        }
        if !run_level.is_empty() {
            run_level.sort();
            results.push(EvaluationResult {
                document: None,
                passed: passed(&run_level),
                findings: run_level,
            });
        }

        Evaluation {
            results,
            complete: !self.token.is_cancelled(),
        }
    }

    fn run_task(&self, task: &Task, set: &DocumentSet) -> Vec<(Option<DocumentId>, Finding)> {
        if self.token.is_cancelled() {
            return Vec::new();
        }
        match task {
            Task::Doc { id, active } => {
                let CheckImpl::Document(check) = &active.rule.check else {
                    return Vec::new();
                };
                let Some(document) = set.get(*id) else {
                    return Vec::new();
                };
                match panic::catch_unwind(AssertUnwindSafe(|| check.inspect(document))) {
                    Ok(violations) => violations
                        .into_iter()
                        .map(|violation| {
                            (
                                Some(*id),
                                enrich(active, violation, Some(document.reference())),
                            )
                        })
                        .collect(),
                    Err(payload) => vec![(
                        Some(*id),
                        internal_finding(
                            active.rule.id,
                            Some(document.reference()),
                            payload.as_ref(),
                        ),
                    )],
                }
            }
            Task::Set { active } => {
                let CheckImpl::Set(check) = &active.rule.check else {
                    return Vec::new();
                };
                match panic::catch_unwind(AssertUnwindSafe(|| check.inspect(set))) {
                    Ok(violations) => violations
                        .into_iter()
                        .filter(|set_violation| {
                            // Waivers also silence cross-document findings
                            // aimed at the waiving object.
                            !set_violation.target.is_some_and(|id| {
                                set.get(id)
                                    .is_some_and(|doc| waiver::is_waived(doc, active.rule.id))
                            })
                        })
                        .map(|set_violation| {
                            let reference = set_violation
                                .target
                                .and_then(|id| set.get(id))
                                .map(|doc| doc.reference());
                            (
                                set_violation.target,
                                enrich(active, set_violation.violation, reference),
                            )
                        })
                        .collect(),
                    Err(payload) => {
                        vec![(None, internal_finding(active.rule.id, None, payload.as_ref()))]
                    }
                }
            }
        }
    }
}

fn passed(findings: &[Finding]) -> bool {
    findings
        .iter()
        .all(|finding| finding.severity != Severity::Error)
}

fn enrich(active: &ActiveRule, violation: Violation, reference: Option<&DocumentRef>) -> Finding {
    let mut finding = Finding::new(
        active.rule.id,
        active.severity,
        violation.path,
        violation.message,
    );
    if let Some(reference) = reference {
        finding = finding.with_document(reference.clone());
    }
    if let Some(remediation) = active.rule.remediation {
        finding = finding.with_remediation(remediation);
    }
    finding
}

fn internal_finding(
    rule_id: &str,
    reference: Option<&DocumentRef>,
    payload: &(dyn Any + Send),
) -> Finding {
    let reason = panic_message(payload);
    warn!("rule {} failed unexpectedly: {}", rule_id, reason);
    let mut finding = Finding::new(
        INTERNAL_RULE_ID,
        Severity::Error,
        Path::root(),
        format!("Rule {} failed unexpectedly: {}", rule_id, reason),
    );
    if let Some(reference) = reference {
        finding = finding.with_document(reference.clone());
    }
    finding
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
