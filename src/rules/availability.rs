//! Availability rules: surviving disruption, drains and rollouts.

use crate::document::{Document, DocumentSet, Node, Path};
use crate::rules::{KindFilter, Rule, SetViolation, workload};
use crate::types::{Category, Severity, Violation};

/// Kinds expected to run replicated and long-lived.
const REPLICATED_KINDS: &[&str] = &["Deployment", "StatefulSet"];

/// Fewest replicas that can tolerate losing one.
const MIN_REPLICAS: i64 = 2;

/// All availability rules, in id order.
pub fn rules() -> Vec<Rule> {
    vec![
        Rule::document(
            "AVL001",
            Category::Availability,
            Severity::Warning,
            "Indicates when containers have neither a liveness nor a readiness probe",
            ProbesConfigured,
        )
        .with_kinds(KindFilter::Kinds(REPLICATED_KINDS))
        .with_remediation("Add a readinessProbe so traffic waits for the container, and a livenessProbe so wedged containers restart."),
        Rule::cross(
            "AVL002",
            Category::Availability,
            Severity::Warning,
            "Indicates when replicated workloads have no PodDisruptionBudget",
            PdbDefined,
        )
        .with_remediation("Add a PodDisruptionBudget whose selector matches the workload's pod labels."),
        Rule::document(
            "AVL003",
            Category::Availability,
            Severity::Warning,
            "Indicates when replicated workloads run fewer than two replicas",
            MinimumReplicas,
        )
        .with_kinds(KindFilter::Kinds(REPLICATED_KINDS))
        .with_remediation("Set spec.replicas to at least 2."),
        Rule::document(
            "AVL004",
            Category::Availability,
            Severity::Warning,
            "Indicates when container images use the latest tag or no tag",
            NoLatestTag,
        )
        .with_remediation("Pin images to a specific tag or digest."),
        Rule::document(
            "AVL005",
            Category::Availability,
            Severity::Info,
            "Indicates when Deployments use the Recreate rollout strategy",
            RollingUpdateStrategy,
        )
        .with_kinds(KindFilter::Kinds(&["Deployment"]))
        .with_remediation("Use the RollingUpdate strategy so rollouts keep serving traffic."),
    ]
}

struct ProbesConfigured;

impl super::DocumentCheck for ProbesConfigured {
    fn inspect(&self, document: &Document) -> Vec<Violation> {
        let mut violations = Vec::new();
        // Init containers run to completion; probes do not apply.
        for (path, container) in workload::containers(document) {
            if container.get("livenessProbe").is_none()
                && container.get("readinessProbe").is_none()
            {
                violations.push(Violation::new(
                    path,
                    format!(
                        "Container '{}' has neither a liveness nor a readiness probe",
                        workload::container_name(container)
                    ),
                ));
            }
        }
        violations
    }
}

struct PdbDefined;

impl super::SetCheck for PdbDefined {
    fn inspect(&self, set: &DocumentSet) -> Vec<SetViolation> {
        let mut violations = Vec::new();
        for (id, document) in set.iter() {
            if !document
                .kind()
                .is_some_and(|kind| REPLICATED_KINDS.contains(&kind))
            {
                continue;
            }
            let labels = workload::pod_template_labels(document);
            let covered = labels.as_ref().is_some_and(|(_, labels)| {
                set.of_kind("PodDisruptionBudget").any(|(_, pdb)| {
                    pdb.namespace() == document.namespace()
                        && pdb
                            .get_at("spec.selector.matchLabels")
                            .is_some_and(|selector| {
                                DocumentSet::selector_matches(selector, Some(labels))
                            })
                })
            });
            if !covered {
                let path = labels.map(|(path, _)| path).unwrap_or_default();
                violations.push(SetViolation::on(
                    id,
                    Violation::new(
                        path,
                        format!(
                            "{} '{}' has no PodDisruptionBudget covering its pods",
                            document.kind().unwrap_or("Workload"),
                            document.name().unwrap_or("<unnamed>")
                        ),
                    ),
                ));
            }
        }
        violations
    }
}

struct MinimumReplicas;

impl super::DocumentCheck for MinimumReplicas {
    fn inspect(&self, document: &Document) -> Vec<Violation> {
        let path = Path::root().key("spec").key("replicas");
        match document.get(&path) {
            None => vec![Violation::new(
                path,
                format!(
                    "Replicas is not set; the implicit default of 1 cannot tolerate disruption (want at least {})",
                    MIN_REPLICAS
                ),
            )],
            Some(node) => match node.as_i64() {
                Some(replicas) if replicas < MIN_REPLICAS => vec![Violation::new(
                    path,
                    format!(
                        "Replicas is set to {}; at least {} are needed to tolerate disruption",
                        replicas, MIN_REPLICAS
                    ),
                )],
                _ => Vec::new(),
            },
        }
    }
}

struct NoLatestTag;

impl super::DocumentCheck for NoLatestTag {
    fn inspect(&self, document: &Document) -> Vec<Violation> {
        let mut violations = Vec::new();
        for (path, container) in workload::all_containers(document) {
            let Some(image) = container.get("image").and_then(Node::as_str) else {
                continue;
            };
            let name = workload::container_name(container);
            if image.ends_with(":latest") {
                violations.push(Violation::new(
                    path.key("image"),
                    format!("Container '{}' uses the 'latest' tag for image '{}'", name, image),
                ));
            } else if !image.contains(':') && !image.contains('@') {
                // No tag and no digest resolves to latest implicitly.
                violations.push(Violation::new(
                    path.key("image"),
                    format!("Container '{}' uses image '{}' with no tag", name, image),
                ));
            }
        }
        violations
    }
}

struct RollingUpdateStrategy;

impl super::DocumentCheck for RollingUpdateStrategy {
    fn inspect(&self, document: &Document) -> Vec<Violation> {
        if document.get_at("spec.strategy.type").and_then(Node::as_str) == Some("Recreate") {
            return vec![Violation::new(
                Path::root().key("spec").key("strategy").key("type"),
                "Deployment uses the Recreate strategy; rollouts stop every pod before starting new ones".to_string(),
            )];
        }
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{DocumentCheck, SetCheck};

    fn doc(yaml: &str) -> Document {
        let value: serde_yaml::Value = serde_yaml::from_str(yaml).unwrap();
        Document::new(Node::from_yaml(value).unwrap(), "test.yaml", 0)
    }

    fn set(manifests: &[&str]) -> DocumentSet {
        DocumentSet::new(
            manifests
                .iter()
                .enumerate()
                .map(|(i, yaml)| {
                    let value: serde_yaml::Value = serde_yaml::from_str(yaml).unwrap();
                    Document::new(Node::from_yaml(value).unwrap(), "test.yaml", i)
                })
                .collect(),
        )
    }

    const DEPLOYMENT: &str = r#"
kind: Deployment
metadata:
  name: web
spec:
  template:
    metadata:
      labels:
        app: web
    spec:
      containers:
        - name: web
          image: web:1.0
"#;

    #[test]
    fn test_probes_missing_both() {
        let d = doc(DEPLOYMENT);
        let violations = ProbesConfigured.inspect(&d);
        assert_eq!(violations.len(), 1);
        assert_eq!(
            violations[0].path.to_string(),
            "spec.template.spec.containers[0]"
        );
    }

    #[test]
    fn test_one_probe_is_enough() {
        let d = doc(
            r#"
kind: Deployment
spec:
  template:
    spec:
      containers:
        - name: web
          readinessProbe:
            httpGet:
              path: /healthz
"#,
        );
        assert!(ProbesConfigured.inspect(&d).is_empty());
    }

    #[test]
    fn test_pdb_present_and_matching() {
        let pdb = r#"
kind: PodDisruptionBudget
metadata:
  name: web-pdb
spec:
  selector:
    matchLabels:
      app: web
"#;
        let documents = set(&[DEPLOYMENT, pdb]);
        assert!(PdbDefined.inspect(&documents).is_empty());
    }

    #[test]
    fn test_pdb_missing() {
        let documents = set(&[DEPLOYMENT]);
        let violations = PdbDefined.inspect(&documents);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].target, Some(crate::document::DocumentId(0)));
        assert_eq!(
            violations[0].violation.path.to_string(),
            "spec.template.metadata.labels"
        );
        assert!(violations[0].violation.message.contains("'web'"));
    }

    #[test]
    fn test_pdb_selector_mismatch() {
        let pdb = r#"
kind: PodDisruptionBudget
spec:
  selector:
    matchLabels:
      app: other
"#;
        let documents = set(&[DEPLOYMENT, pdb]);
        assert_eq!(PdbDefined.inspect(&documents).len(), 1);
    }

    #[test]
    fn test_pdb_namespace_must_match() {
        let pdb = r#"
kind: PodDisruptionBudget
metadata:
  namespace: other
spec:
  selector:
    matchLabels:
      app: web
"#;
        let documents = set(&[DEPLOYMENT, pdb]);
        assert_eq!(PdbDefined.inspect(&documents).len(), 1);
    }

    #[test]
    fn test_replicas_unset_and_low() {
        let unset = doc("kind: Deployment\nspec: {}\n");
        let violations = MinimumReplicas.inspect(&unset);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.contains("not set"));

        let low = doc("kind: Deployment\nspec:\n  replicas: 1\n");
        let violations = MinimumReplicas.inspect(&low);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].path.to_string(), "spec.replicas");

        let fine = doc("kind: Deployment\nspec:\n  replicas: 3\n");
        assert!(MinimumReplicas.inspect(&fine).is_empty());
    }

    #[test]
    fn test_latest_tag_variants() {
        let d = doc(
            r#"
kind: Pod
spec:
  containers:
    - name: explicit
      image: myapp:latest
    - name: implicit
      image: myapp
    - name: pinned
      image: myapp:1.2.3
    - name: digest
      image: myapp@sha256:abcd
"#,
        );
        let violations = NoLatestTag.inspect(&d);
        assert_eq!(violations.len(), 2);
        assert_eq!(violations[0].path.to_string(), "spec.containers[0].image");
        assert!(violations[0].message.contains("latest"));
        assert_eq!(violations[1].path.to_string(), "spec.containers[1].image");
        assert!(violations[1].message.contains("no tag"));
    }

    #[test]
    fn test_recreate_strategy() {
        let d = doc("kind: Deployment\nspec:\n  strategy:\n    type: Recreate\n");
        let violations = RollingUpdateStrategy.inspect(&d);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].path.to_string(), "spec.strategy.type");

        let rolling = doc("kind: Deployment\nspec:\n  strategy:\n    type: RollingUpdate\n");
        assert!(RollingUpdateStrategy.inspect(&rolling).is_empty());
    }
}
