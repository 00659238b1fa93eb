//! Run configuration.
//!
//! Loaded from a YAML file (`--config`, or `.conformity.yaml` /
//! `.conformity.yml` in the working directory), then adjusted by CLI
//! flags. The config only selects and re-classifies rules; rule behavior
//! itself is never configurable here.

use crate::error::{ConformityError, Result};
use crate::types::{Category, Severity};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// File names probed when no `--config` is given.
const DEFAULT_LOCATIONS: &[&str] = &[".conformity.yaml", ".conformity.yml"];

/// Rule selection and severity policy for a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ConformityConfig {
    /// Categories to enable. Empty means all categories.
    pub enabled_categories: Vec<Category>,
    /// Rule ids to enable. When non-empty this overrides the category
    /// filter entirely.
    pub enabled_rule_ids: Vec<String>,
    /// Per-rule severity overrides, applied after selection.
    pub severity_overrides: BTreeMap<String, Severity>,
    /// Minimum severity that makes the run exit non-zero.
    pub fail_on: Severity,
    /// Worker threads for evaluation. Absent means the rayon default.
    pub concurrency: Option<usize>,
}

impl ConformityConfig {
    /// Create a configuration with defaults (all rules, fail on error).
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable only the given categories.
    pub fn with_categories(mut self, categories: Vec<Category>) -> Self {
        self.enabled_categories = categories;
        self
    }

    /// Enable only the given rule ids.
    pub fn with_rules(mut self, rule_ids: Vec<String>) -> Self {
        self.enabled_rule_ids = rule_ids;
        self
    }

    /// Override one rule's severity.
    pub fn with_override(mut self, rule_id: impl Into<String>, severity: Severity) -> Self {
        self.severity_overrides.insert(rule_id.into(), severity);
        self
    }

    /// Set the failure threshold.
    pub fn with_fail_on(mut self, severity: Severity) -> Self {
        self.fail_on = severity;
        self
    }

    /// Bound the evaluation worker pool.
    pub fn with_concurrency(mut self, workers: usize) -> Self {
        self.concurrency = Some(workers);
        self
    }

    /// Load configuration from a YAML file.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)?;
        Self::load_from_str(&raw)
            .map_err(|e| ConformityError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Parse configuration from a YAML string.
    pub fn load_from_str(raw: &str) -> Result<Self> {
        serde_yaml::from_str(raw).map_err(|e| ConformityError::Config(e.to_string()))
    }

    /// Load from the default locations, falling back to defaults when no
    /// config file exists.
    pub fn load_default() -> Result<Self> {
        for candidate in DEFAULT_LOCATIONS {
            if Path::new(candidate).exists() {
                debug!("loading configuration from {}", candidate);
                return Self::load_from_file(candidate);
            }
        }
        debug!("no configuration file found, using defaults");
        Ok(Self::default())
    }
}
