//! Core types shared across the checker.
//!
//! - `Severity` - Finding severity levels
//! - `Category` - Rule groupings (security, resources, ...)
//! - `Violation` - Raw rule output before enrichment
//! - `Finding` - An enriched, reportable violation

use crate::document::{DocumentRef, Path};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Rule id reserved for findings the evaluator synthesizes when a rule
/// fails unexpectedly. Cannot be registered or waived.
pub const INTERNAL_RULE_ID: &str = "INTERNAL";

/// Severity levels for findings.
///
/// Ordered from most severe to least severe:
/// `Error > Warning > Info`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Violations that make a workload unsafe to run
    #[default]
    Error,
    /// Violations that should be addressed before production
    Warning,
    /// Suggestions and hardening advice
    Info,
}

impl Severity {
    /// Parse a severity from a string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "error" => Some(Self::Error),
            "warning" => Some(Self::Warning),
            "info" => Some(Self::Info),
            _ => None,
        }
    }

    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Ord for Severity {
    fn cmp(&self, other: &Self) -> Ordering {
        // Higher severity = lower numeric value for Ord
        let self_val = match self {
            Self::Error => 0,
            Self::Warning => 1,
            Self::Info => 2,
        };
        let other_val = match other {
            Self::Error => 0,
            Self::Warning => 1,
            Self::Info => 2,
        };
        // Reverse so Error > Warning > Info
        other_val.cmp(&self_val)
    }
}

impl PartialOrd for Severity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Rule categories. Every builtin rule belongs to exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Security,
    Resources,
    Availability,
    Networking,
    Observability,
}

impl Category {
    /// All categories, in catalog order.
    pub const ALL: [Category; 5] = [
        Self::Security,
        Self::Resources,
        Self::Availability,
        Self::Networking,
        Self::Observability,
    ];

    /// Parse a category from a string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "security" => Some(Self::Security),
            "resources" => Some(Self::Resources),
            "availability" => Some(Self::Availability),
            "networking" => Some(Self::Networking),
            "observability" => Some(Self::Observability),
            _ => None,
        }
    }

    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Security => "security",
            Self::Resources => "resources",
            Self::Availability => "availability",
            Self::Networking => "networking",
            Self::Observability => "observability",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single violation produced by a rule.
///
/// This is the raw output of a rule before the evaluator enriches it
/// with the rule id, effective severity and document identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Path into the document pinpointing the violation.
    pub path: Path,
    /// Human-readable description of what is wrong.
    pub message: String,
}

impl Violation {
    /// Create a new violation at the given path.
    pub fn new(path: Path, message: impl Into<String>) -> Self {
        Self {
            path,
            message: message.into(),
        }
    }
}

/// An enriched violation, ready for reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    /// Stable id of the rule that produced this finding.
    pub rule_id: String,
    /// Effective severity (default or overridden by configuration).
    pub severity: Severity,
    /// Path into the document pinpointing the finding.
    pub path: Path,
    /// Human-readable message.
    pub message: String,
    /// Identity of the document the finding concerns, if any.
    pub document: Option<DocumentRef>,
    /// Remediation advice, shown by the human reporter.
    pub remediation: Option<String>,
}

impl Finding {
    /// Create a new finding.
    pub fn new(
        rule_id: impl Into<String>,
        severity: Severity,
        path: Path,
        message: impl Into<String>,
    ) -> Self {
        Self {
            rule_id: rule_id.into(),
            severity,
            path,
            message: message.into(),
            document: None,
            remediation: None,
        }
    }

    /// Attach the document this finding concerns.
    pub fn with_document(mut self, document: DocumentRef) -> Self {
        self.document = Some(document);
        self
    }

    /// Attach remediation advice.
    pub fn with_remediation(mut self, remediation: impl Into<String>) -> Self {
        self.remediation = Some(remediation.into());
        self
    }
}

impl Ord for Finding {
    fn cmp(&self, other: &Self) -> Ordering {
        // Sort by path, then rule id; severity and message break remaining
        // ties so repeated runs produce byte-identical output.
        self.path
            .cmp(&other.path)
            .then_with(|| self.rule_id.cmp(&other.rule_id))
            .then_with(|| self.severity.cmp(&other.severity))
            .then_with(|| self.message.cmp(&other.message))
    }
}

impl PartialOrd for Finding {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Error > Severity::Warning);
        assert!(Severity::Warning > Severity::Info);
    }

    #[test]
    fn test_severity_parse() {
        assert_eq!(Severity::parse("error"), Some(Severity::Error));
        assert_eq!(Severity::parse("WARNING"), Some(Severity::Warning));
        assert_eq!(Severity::parse("Info"), Some(Severity::Info));
        assert_eq!(Severity::parse("fatal"), None);
    }

    #[test]
    fn test_category_parse() {
        assert_eq!(Category::parse("security"), Some(Category::Security));
        assert_eq!(Category::parse("Availability"), Some(Category::Availability));
        assert_eq!(Category::parse("durability"), None);
    }

    #[test]
    fn test_finding_ordering() {
        let f1 = Finding::new(
            "RES001",
            Severity::Error,
            "spec.containers[1].resources".parse().unwrap(),
            "missing limits",
        );
        let f2 = Finding::new(
            "AVL004",
            Severity::Warning,
            "spec.containers[0].image".parse().unwrap(),
            "latest tag",
        );
        let f3 = Finding::new(
            "SEC001",
            Severity::Error,
            "spec.containers[0].image".parse().unwrap(),
            "same path, later id",
        );

        let mut findings = vec![f1.clone(), f2.clone(), f3.clone()];
        findings.sort();

        // Path first, then rule id
        assert_eq!(findings[0].rule_id, "AVL004");
        assert_eq!(findings[1].rule_id, "SEC001");
        assert_eq!(findings[2].rule_id, "RES001");
    }
}
