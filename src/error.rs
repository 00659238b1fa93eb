//! Error taxonomy for the checker.
//!
//! Startup problems (unreadable config, bad rule references, pool setup)
//! are fatal and surface here. Per-document parse failures are not errors;
//! they travel inside the run report so sibling documents keep evaluating.

use thiserror::Error;

/// Errors that abort a run before any report is produced.
#[derive(Debug, Error)]
pub enum ConformityError {
    /// A rule with the same id was registered twice.
    #[error("duplicate rule id '{0}' in catalog")]
    DuplicateRuleId(String),

    /// Configuration referenced a rule id that is not in the catalog.
    #[error("unknown rule id '{0}' referenced by configuration")]
    UnknownRuleId(String),

    /// Configuration referenced a category that does not exist.
    #[error("unknown category '{0}' referenced by configuration")]
    UnknownCategory(String),

    /// Attempt to register a rule under a reserved id.
    #[error("rule id '{0}' is reserved")]
    ReservedRuleId(String),

    /// Configuration file could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Worker pool could not be constructed.
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// Background evaluation task died before producing a report.
    #[error("evaluation task failed: {0}")]
    Runtime(String),

    /// Underlying I/O failure (reading inputs or writing reports).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type used throughout the crate.
pub type Result<T> = std::result::Result<T, ConformityError>;
