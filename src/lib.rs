//! # Conformity
//!
//! A policy conformance checker for Kubernetes workload manifests. Parses
//! YAML or JSON manifests into a uniform document tree, evaluates a catalog
//! of stateless rules against each document (and cross-document rules
//! against the whole set) in parallel, and renders the findings as grouped
//! text or stable machine-readable JSON.
//!
//! ## Features
//!
//! - **Rule Catalog**: Security, resource governance, availability,
//!   networking and observability rules with stable ids
//! - **Fault Isolation**: A misbehaving rule becomes a finding, never a
//!   crash; every other rule still reports
//! - **Deterministic Output**: Identical inputs produce identical reports
//!   regardless of parallel scheduling
//! - **Cross-Document Analysis**: PodDisruptionBudget coverage and Service
//!   selector matching see the whole manifest set
//! - **Waivers**: Objects opt out of a rule with an annotation, with the
//!   reason kept in the manifest
//!
//! ## Example
//!
//! ```rust,no_run
//! use conformity::config::ConformityConfig;
//! use conformity::document::{SourceFormat, parse_content};
//! use conformity::evaluator::CancelToken;
//! use conformity::runner;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let raw = std::fs::read_to_string("deploy.yaml")?;
//! let outcome = parse_content(&raw, SourceFormat::Yaml, "deploy.yaml");
//! let report = runner::execute(outcome, &ConformityConfig::default(), CancelToken::new())?;
//! for result in &report.results {
//!     for finding in &result.findings {
//!         println!("{} {}: {}", finding.severity, finding.rule_id, finding.message);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod document;
pub mod error;
pub mod evaluator;
pub mod report;
pub mod rules;
pub mod runner;
pub mod types;
pub mod waiver;

// Re-export commonly used types and functions
pub use config::ConformityConfig;
pub use error::{ConformityError, Result};
pub use evaluator::{CancelToken, Evaluation, EvaluationResult, Evaluator};
pub use runner::{RunReport, RunSummary};
pub use types::{Category, Finding, Severity, Violation};

/// The current version of the checker
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
