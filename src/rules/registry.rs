//! The rule registry and per-run rule sets.
//!
//! The registry owns every known rule, in registration order. A run never
//! touches the registry directly: `instantiate` resolves the configured
//! selection into a [`RuleSet`] once, with effective severities baked in,
//! and that read-only set is what the evaluator shares across workers.

use crate::config::ConformityConfig;
use crate::error::{ConformityError, Result};
use crate::rules::{Rule, availability, networking, observability, resources, security};
use crate::types::{Category, INTERNAL_RULE_ID, Severity};
use log::debug;
use std::sync::Arc;

/// All registered rules, ids unique.
pub struct RuleRegistry {
    rules: Vec<Arc<Rule>>,
}

impl RuleRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// The full builtin catalog.
    pub fn builtin() -> Result<Self> {
        let mut registry = Self::new();
        let catalog = security::rules()
            .into_iter()
            .chain(resources::rules())
            .chain(availability::rules())
            .chain(networking::rules())
            .chain(observability::rules());
        for rule in catalog {
            registry.register(rule)?;
        }
        Ok(registry)
    }

    /// Register a rule. Ids must be unique; `INTERNAL` is reserved for
    /// the evaluator.
    pub fn register(&mut self, rule: Rule) -> Result<()> {
        if rule.id == INTERNAL_RULE_ID {
            return Err(ConformityError::ReservedRuleId(rule.id.to_string()));
        }
        if self.rules.iter().any(|existing| existing.id == rule.id) {
            return Err(ConformityError::DuplicateRuleId(rule.id.to_string()));
        }
        self.rules.push(Arc::new(rule));
        Ok(())
    }

    /// Look up a rule by id.
    pub fn get(&self, id: &str) -> Option<&Arc<Rule>> {
        self.rules.iter().find(|rule| rule.id == id)
    }

    /// All rules in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Rule>> {
        self.rules.iter()
    }

    /// Rules of one category, in registration order.
    pub fn of_category(&self, category: Category) -> impl Iterator<Item = &Arc<Rule>> {
        self.rules.iter().filter(move |rule| rule.category == category)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Resolve the configured selection into an active rule set.
    ///
    /// `enabledRuleIds` wins over `enabledCategories` when both are set;
    /// an empty selection enables everything. Any rule id the config
    /// mentions must exist in this registry.
    pub fn instantiate(&self, config: &ConformityConfig) -> Result<RuleSet> {
        for id in config
            .enabled_rule_ids
            .iter()
            .chain(config.severity_overrides.keys())
        {
            if self.get(id).is_none() {
                return Err(ConformityError::UnknownRuleId(id.clone()));
            }
        }

        let selected: Vec<&Arc<Rule>> = if !config.enabled_rule_ids.is_empty() {
            self.rules
                .iter()
                .filter(|rule| config.enabled_rule_ids.iter().any(|id| id == rule.id))
                .collect()
        } else if !config.enabled_categories.is_empty() {
            self.rules
                .iter()
                .filter(|rule| config.enabled_categories.contains(&rule.category))
                .collect()
        } else {
            self.rules.iter().collect()
        };

        let rules: Vec<ActiveRule> = selected
            .into_iter()
            .map(|rule| ActiveRule {
                severity: config
                    .severity_overrides
                    .get(rule.id)
                    .copied()
                    .unwrap_or(rule.severity),
                rule: Arc::clone(rule),
            })
            .collect();

        debug!("activated {} of {} rules", rules.len(), self.rules.len());
        Ok(RuleSet { rules })
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// A rule activated for one run, with its effective severity resolved.
#[derive(Clone)]
pub struct ActiveRule {
    pub rule: Arc<Rule>,
    /// Default severity, or the configured override.
    pub severity: Severity,
}

/// The ordered, read-only set of rules a run evaluates.
pub struct RuleSet {
    rules: Vec<ActiveRule>,
}

impl RuleSet {
    pub fn rules(&self) -> &[ActiveRule] {
        &self.rules
    }

    /// Single-document rules.
    pub fn document_rules(&self) -> impl Iterator<Item = &ActiveRule> {
        self.rules
            .iter()
            .filter(|active| !active.rule.is_cross_document())
    }

    /// Cross-document rules.
    pub fn set_rules(&self) -> impl Iterator<Item = &ActiveRule> {
        self.rules
            .iter()
            .filter(|active| active.rule.is_cross_document())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::types::Violation;

    fn noop_rule(id: &'static str, category: Category, severity: Severity) -> Rule {
        Rule::document(id, category, severity, "test rule", |_: &Document| {
            Vec::<Violation>::new()
        })
    }

    #[test]
    fn test_builtin_catalog_is_consistent() {
        let registry = RuleRegistry::builtin().unwrap();
        assert!(registry.len() >= 16);
        // Every category is populated.
        for category in Category::ALL {
            assert!(
                registry.of_category(category).count() > 0,
                "no rules in {}",
                category
            );
        }
        // Cross-document rules exist.
        assert!(registry.iter().any(|rule| rule.is_cross_document()));
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut registry = RuleRegistry::new();
        registry
            .register(noop_rule("TST001", Category::Security, Severity::Error))
            .unwrap();
        let result = registry.register(noop_rule("TST001", Category::Resources, Severity::Info));
        assert!(matches!(result, Err(ConformityError::DuplicateRuleId(id)) if id == "TST001"));
    }

    #[test]
    fn test_internal_id_reserved() {
        let mut registry = RuleRegistry::new();
        let result = registry.register(noop_rule(
            INTERNAL_RULE_ID,
            Category::Security,
            Severity::Error,
        ));
        assert!(matches!(result, Err(ConformityError::ReservedRuleId(_))));
    }

    #[test]
    fn test_instantiate_all_by_default() {
        let registry = RuleRegistry::builtin().unwrap();
        let set = registry.instantiate(&ConformityConfig::default()).unwrap();
        assert_eq!(set.len(), registry.len());
    }

    #[test]
    fn test_instantiate_filters_by_category() {
        let registry = RuleRegistry::builtin().unwrap();
        let config = ConformityConfig::new().with_categories(vec![Category::Security]);
        let set = registry.instantiate(&config).unwrap();
        assert!(set.len() < registry.len());
        assert!(
            set.rules()
                .iter()
                .all(|active| active.rule.category == Category::Security)
        );
    }

    #[test]
    fn test_rule_ids_override_categories() {
        let registry = RuleRegistry::builtin().unwrap();
        let config = ConformityConfig::new()
            .with_categories(vec![Category::Security])
            .with_rules(vec!["AVL004".to_string()]);
        let set = registry.instantiate(&config).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.rules()[0].rule.id, "AVL004");
    }

    #[test]
    fn test_severity_override_applied() {
        let registry = RuleRegistry::builtin().unwrap();
        let config = ConformityConfig::new().with_override("AVL004", Severity::Error);
        let set = registry.instantiate(&config).unwrap();
        let active = set
            .rules()
            .iter()
            .find(|active| active.rule.id == "AVL004")
            .unwrap();
        assert_eq!(active.severity, Severity::Error);
        assert_eq!(active.rule.severity, Severity::Warning);
    }

    #[test]
    fn test_unknown_rule_id_rejected() {
        let registry = RuleRegistry::builtin().unwrap();
        let config = ConformityConfig::new().with_rules(vec!["NOPE999".to_string()]);
        assert!(matches!(
            registry.instantiate(&config),
            Err(ConformityError::UnknownRuleId(id)) if id == "NOPE999"
        ));

        let config = ConformityConfig::new().with_override("NOPE999", Severity::Info);
        assert!(matches!(
            registry.instantiate(&config),
            Err(ConformityError::UnknownRuleId(_))
        ));
    }
}
