//! The rule model.
//!
//! A rule is a stateless, deterministic predicate over manifests. Most
//! rules inspect one document at a time; cross-document rules (PDB
//! coverage, service selectors) receive the whole document set. Rules
//! return raw violations; the evaluator enriches them into findings with
//! rule id, effective severity and document identity.

pub mod availability;
pub mod networking;
pub mod observability;
pub mod registry;
pub mod resources;
pub mod security;
pub mod workload;

use crate::document::{Document, DocumentId, DocumentSet};
use crate::types::{Category, Severity, Violation};

/// A check over a single document.
pub trait DocumentCheck: Send + Sync {
    /// Inspect one document and return any violations.
    fn inspect(&self, document: &Document) -> Vec<Violation>;
}

impl<F> DocumentCheck for F
where
    F: Fn(&Document) -> Vec<Violation> + Send + Sync,
{
    fn inspect(&self, document: &Document) -> Vec<Violation> {
        self(document)
    }
}

/// A check over the whole document set.
pub trait SetCheck: Send + Sync {
    /// Inspect the set and return any violations, each optionally
    /// attached to a document.
    fn inspect(&self, set: &DocumentSet) -> Vec<SetViolation>;
}

impl<F> SetCheck for F
where
    F: Fn(&DocumentSet) -> Vec<SetViolation> + Send + Sync,
{
    fn inspect(&self, set: &DocumentSet) -> Vec<SetViolation> {
        self(set)
    }
}

/// A violation from a cross-document rule. Violations without a target
/// document land in the synthetic run-level result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetViolation {
    pub target: Option<DocumentId>,
    pub violation: Violation,
}

impl SetViolation {
    /// A violation attached to one document in the set.
    pub fn on(target: DocumentId, violation: Violation) -> Self {
        Self {
            target: Some(target),
            violation,
        }
    }

    /// A violation that concerns the set as a whole.
    pub fn run_level(violation: Violation) -> Self {
        Self {
            target: None,
            violation,
        }
    }
}

/// How a rule evaluates.
pub enum CheckImpl {
    Document(Box<dyn DocumentCheck>),
    Set(Box<dyn SetCheck>),
}

/// Kinds that carry a pod spec somewhere.
pub const WORKLOAD_KINDS: &[&str] = &[
    "Deployment",
    "StatefulSet",
    "DaemonSet",
    "ReplicaSet",
    "Pod",
    "Job",
    "CronJob",
];

/// Which document kinds a rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindFilter {
    /// Anything in [`WORKLOAD_KINDS`].
    Workloads,
    /// An explicit list of kinds.
    Kinds(&'static [&'static str]),
    /// Every document, kind or no kind.
    Any,
}

impl KindFilter {
    /// Whether a document of the given kind is in scope.
    pub fn matches(&self, kind: Option<&str>) -> bool {
        match self {
            Self::Any => true,
            Self::Workloads => kind.is_some_and(|k| WORKLOAD_KINDS.contains(&k)),
            Self::Kinds(kinds) => kind.is_some_and(|k| kinds.contains(&k)),
        }
    }
}

/// One conformance rule: identity, classification and the check itself.
pub struct Rule {
    /// Stable id, e.g. `SEC001`. Never reused or renumbered.
    pub id: &'static str,
    pub category: Category,
    /// Default severity; configuration may override per rule id.
    pub severity: Severity,
    /// One-line description shown by `conformity rules`.
    pub description: &'static str,
    /// Remediation advice attached to findings.
    pub remediation: Option<&'static str>,
    /// Kind scope; out-of-scope documents are skipped, not failed.
    pub applies_to: KindFilter,
    pub check: CheckImpl,
}

impl Rule {
    /// Build a single-document rule. Applies to workload kinds unless
    /// retargeted with [`with_kinds`].
    ///
    /// [`with_kinds`]: Rule::with_kinds
    pub fn document(
        id: &'static str,
        category: Category,
        severity: Severity,
        description: &'static str,
        check: impl DocumentCheck + 'static,
    ) -> Self {
        Self {
            id,
            category,
            severity,
            description,
            remediation: None,
            applies_to: KindFilter::Workloads,
            check: CheckImpl::Document(Box::new(check)),
        }
    }

    /// Build a cross-document rule. The kind filter documents intent;
    /// the check receives the full set regardless.
    pub fn cross(
        id: &'static str,
        category: Category,
        severity: Severity,
        description: &'static str,
        check: impl SetCheck + 'static,
    ) -> Self {
        Self {
            id,
            category,
            severity,
            description,
            remediation: None,
            applies_to: KindFilter::Any,
            check: CheckImpl::Set(Box::new(check)),
        }
    }

    /// Attach remediation advice.
    pub fn with_remediation(mut self, remediation: &'static str) -> Self {
        self.remediation = Some(remediation);
        self
    }

    /// Restrict the kinds this rule applies to.
    pub fn with_kinds(mut self, filter: KindFilter) -> Self {
        self.applies_to = filter;
        self
    }

    /// Whether this rule needs the whole document set.
    pub fn is_cross_document(&self) -> bool {
        matches!(self.check, CheckImpl::Set(_))
    }

    /// Whether this rule applies to the given document.
    pub fn applies(&self, document: &Document) -> bool {
        self.applies_to.matches(document.kind())
    }
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("id", &self.id)
            .field("category", &self.category)
            .field("severity", &self.severity)
            .field("cross_document", &self.is_cross_document())
            .finish()
    }
}
