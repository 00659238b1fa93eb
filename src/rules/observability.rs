//! Observability rules.

use crate::document::{Document, Path};
use crate::rules::{Rule, workload};
use crate::types::{Category, Severity, Violation};

/// Label every tool in the ecosystem keys on.
const NAME_LABEL: &str = "app.kubernetes.io/name";

/// All observability rules, in id order.
pub fn rules() -> Vec<Rule> {
    vec![
        Rule::document(
            "OBS001",
            Category::Observability,
            Severity::Info,
            "Indicates when workloads are missing the app.kubernetes.io/name label",
            RecommendedLabels,
        )
        .with_remediation("Add the app.kubernetes.io/name label to the workload metadata."),
    ]
}

struct RecommendedLabels;

impl super::DocumentCheck for RecommendedLabels {
    fn inspect(&self, document: &Document) -> Vec<Violation> {
        // Only meaningful for things that actually run; the kind filter
        // narrows this to workloads, but a direct call should agree.
        if workload::pod_spec(document).is_none() {
            return Vec::new();
        }
        let labeled = document
            .labels()
            .is_some_and(|labels| labels.get(NAME_LABEL).is_some());
        if labeled {
            return Vec::new();
        }
        vec![Violation::new(
            Path::root().key("metadata").key("labels"),
            format!(
                "{} '{}' is missing the {} label",
                document.kind().unwrap_or("Workload"),
                document.name().unwrap_or("<unnamed>"),
                NAME_LABEL
            ),
        )]
    }
}
