//! Networking rules.

use crate::document::{Document, DocumentSet, Node};
use crate::rules::{Rule, SetViolation, WORKLOAD_KINDS, workload};
use crate::types::{Category, Severity, Violation};

/// All networking rules, in id order.
pub fn rules() -> Vec<Rule> {
    vec![
        Rule::document(
            "NET001",
            Category::Networking,
            Severity::Error,
            "Indicates when pods share the host network namespace",
            HostNetwork,
        )
        .with_remediation("Remove hostNetwork from the pod spec and expose ports through a Service."),
        Rule::cross(
            "NET002",
            Category::Networking,
            Severity::Warning,
            "Indicates when Services select no pods in the manifest set",
            ServiceSelector,
        )
        .with_remediation("Make spec.selector match the labels of a workload's pod template."),
    ]
}

struct HostNetwork;

impl super::DocumentCheck for HostNetwork {
    fn inspect(&self, document: &Document) -> Vec<Violation> {
        let Some((spec_path, spec)) = workload::pod_spec(document) else {
            return Vec::new();
        };
        if spec.get("hostNetwork").and_then(Node::as_bool) == Some(true) {
            return vec![Violation::new(
                spec_path.key("hostNetwork"),
                "Pod shares the host network namespace".to_string(),
            )];
        }
        Vec::new()
    }
}

struct ServiceSelector;

impl super::SetCheck for ServiceSelector {
    fn inspect(&self, set: &DocumentSet) -> Vec<SetViolation> {
        let mut violations = Vec::new();
        for (id, service) in set.of_kind("Service") {
            let Some(selector) = service.get_at("spec.selector") else {
                // Selector-less Services (ExternalName, manual endpoints)
                // are legitimate.
                continue;
            };
            if selector.as_mapping().is_none_or(|entries| entries.is_empty()) {
                continue;
            }
            let matched = set.iter().any(|(_, candidate)| {
                candidate
                    .kind()
                    .is_some_and(|kind| WORKLOAD_KINDS.contains(&kind))
                    && candidate.namespace() == service.namespace()
                    && workload::pod_template_labels(candidate)
                        .is_some_and(|(_, labels)| {
                            DocumentSet::selector_matches(selector, Some(labels))
                        })
            });
            if !matched {
                violations.push(SetViolation::on(
                    id,
                    Violation::new(
                        crate::document::Path::root().key("spec").key("selector"),
                        format!(
                            "Service '{}' selects no pods in this manifest set",
                            service.name().unwrap_or("<unnamed>")
                        ),
                    ),
                ));
            }
        }
        violations
    }
}
