//! Security rules: privilege boundaries of pods and their containers.

use crate::document::{Document, Node};
use crate::rules::{Rule, workload};
use crate::types::{Category, Severity, Violation};

/// All security rules, in id order.
pub fn rules() -> Vec<Rule> {
    vec![
        Rule::document(
            "SEC001",
            Category::Security,
            Severity::Error,
            "Indicates when containers are not assured to run as non-root",
            NonRootUser,
        )
        .with_remediation("Set securityContext.runAsNonRoot to true at pod or container level."),
        Rule::document(
            "SEC002",
            Category::Security,
            Severity::Error,
            "Indicates when containers run in privileged mode",
            PrivilegedContainer,
        )
        .with_remediation("Remove securityContext.privileged or set it to false."),
        Rule::document(
            "SEC003",
            Category::Security,
            Severity::Warning,
            "Indicates when containers allow privilege escalation",
            PrivilegeEscalation,
        )
        .with_remediation("Set securityContext.allowPrivilegeEscalation to false."),
        Rule::document(
            "SEC004",
            Category::Security,
            Severity::Warning,
            "Indicates when containers run with a writable root filesystem",
            ReadOnlyRootFilesystem,
        )
        .with_remediation("Set securityContext.readOnlyRootFilesystem to true and mount writable volumes where needed."),
        Rule::document(
            "SEC005",
            Category::Security,
            Severity::Error,
            "Indicates when pods share the host PID or IPC namespace",
            HostNamespaces,
        )
        .with_remediation("Remove hostPID and hostIPC from the pod spec."),
    ]
}

struct NonRootUser;

impl super::DocumentCheck for NonRootUser {
    fn inspect(&self, document: &Document) -> Vec<Violation> {
        let mut violations = Vec::new();
        let Some((_, spec)) = workload::pod_spec(document) else {
            return violations;
        };
        let pod_level = spec
            .at("securityContext.runAsNonRoot")
            .and_then(Node::as_bool);

        for (path, container) in workload::all_containers(document) {
            // Container-level overrides pod-level
            let container_level = container
                .at("securityContext.runAsNonRoot")
                .and_then(Node::as_bool);
            let effective = container_level.or(pod_level);

            if effective != Some(true) {
                violations.push(Violation::new(
                    path.key("securityContext").key("runAsNonRoot"),
                    format!(
                        "Container '{}' is not assured to run as non-root",
                        workload::container_name(container)
                    ),
                ));
            }
        }
        violations
    }
}

struct PrivilegedContainer;

impl super::DocumentCheck for PrivilegedContainer {
    fn inspect(&self, document: &Document) -> Vec<Violation> {
        let mut violations = Vec::new();
        for (path, container) in workload::all_containers(document) {
            if container.at("securityContext.privileged").and_then(Node::as_bool) == Some(true) {
                violations.push(Violation::new(
                    path.key("securityContext").key("privileged"),
                    format!(
                        "Container '{}' runs in privileged mode",
                        workload::container_name(container)
                    ),
                ));
            }
        }
        violations
    }
}

struct PrivilegeEscalation;

impl super::DocumentCheck for PrivilegeEscalation {
    fn inspect(&self, document: &Document) -> Vec<Violation> {
        let mut violations = Vec::new();
        for (path, container) in workload::all_containers(document) {
            // Kubernetes defaults allowPrivilegeEscalation to true, so
            // absent counts as allowed.
            let allows = container
                .at("securityContext.allowPrivilegeEscalation")
                .and_then(Node::as_bool)
                != Some(false);
            if allows {
                violations.push(Violation::new(
                    path.key("securityContext").key("allowPrivilegeEscalation"),
                    format!(
                        "Container '{}' allows privilege escalation",
                        workload::container_name(container)
                    ),
                ));
            }
        }
        violations
    }
}

struct ReadOnlyRootFilesystem;

impl super::DocumentCheck for ReadOnlyRootFilesystem {
    fn inspect(&self, document: &Document) -> Vec<Violation> {
        let mut violations = Vec::new();
        for (path, container) in workload::all_containers(document) {
            let read_only = container
                .at("securityContext.readOnlyRootFilesystem")
                .and_then(Node::as_bool)
                == Some(true);
            if !read_only {
                violations.push(Violation::new(
                    path.key("securityContext").key("readOnlyRootFilesystem"),
                    format!(
                        "Container '{}' runs with a writable root filesystem",
                        workload::container_name(container)
                    ),
                ));
            }
        }
        violations
    }
}

struct HostNamespaces;

impl super::DocumentCheck for HostNamespaces {
    fn inspect(&self, document: &Document) -> Vec<Violation> {
        let mut violations = Vec::new();
        let Some((spec_path, spec)) = workload::pod_spec(document) else {
            return violations;
        };
        for (field, label) in [("hostPID", "PID"), ("hostIPC", "IPC")] {
            if spec.get(field).and_then(Node::as_bool) == Some(true) {
                violations.push(Violation::new(
                    spec_path.clone().key(field),
                    format!("Pod shares the host {} namespace", label),
                ));
            }
        }
        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::DocumentCheck;

    fn doc(yaml: &str) -> Document {
        let value: serde_yaml::Value = serde_yaml::from_str(yaml).unwrap();
        Document::new(Node::from_yaml(value).unwrap(), "test.yaml", 0)
    }

    #[test]
    fn test_non_root_flagged_when_unset() {
        let d = doc(
            r#"
kind: Pod
spec:
  containers:
    - name: web
      image: nginx:1.27
"#,
        );
        let violations = NonRootUser.inspect(&d);
        assert_eq!(violations.len(), 1);
        assert_eq!(
            violations[0].path.to_string(),
            "spec.containers[0].securityContext.runAsNonRoot"
        );
        assert!(violations[0].message.contains("'web'"));
    }

    #[test]
    fn test_pod_level_non_root_satisfies_containers() {
        let d = doc(
            r#"
kind: Pod
spec:
  securityContext:
    runAsNonRoot: true
  containers:
    - name: web
"#,
        );
        assert!(NonRootUser.inspect(&d).is_empty());
    }

    #[test]
    fn test_container_override_beats_pod_level() {
        let d = doc(
            r#"
kind: Pod
spec:
  securityContext:
    runAsNonRoot: true
  containers:
    - name: web
      securityContext:
        runAsNonRoot: false
"#,
        );
        assert_eq!(NonRootUser.inspect(&d).len(), 1);
    }

    #[test]
    fn test_privileged_container() {
        let d = doc(
            r#"
kind: Pod
spec:
  containers:
    - name: ok
    - name: bad
      securityContext:
        privileged: true
"#,
        );
        let violations = PrivilegedContainer.inspect(&d);
        assert_eq!(violations.len(), 1);
        assert_eq!(
            violations[0].path.to_string(),
            "spec.containers[1].securityContext.privileged"
        );
    }

    #[test]
    fn test_privilege_escalation_default_counts() {
        let d = doc(
            r#"
kind: Pod
spec:
  containers:
    - name: open
    - name: closed
      securityContext:
        allowPrivilegeEscalation: false
"#,
        );
        let violations = PrivilegeEscalation.inspect(&d);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.contains("'open'"));
    }

    #[test]
    fn test_read_only_root_fs() {
        let d = doc(
            r#"
kind: Pod
spec:
  containers:
    - name: good
      securityContext:
        readOnlyRootFilesystem: true
  initContainers:
    - name: setup
"#,
        );
        let violations = ReadOnlyRootFilesystem.inspect(&d);
        // Init containers are covered too.
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.contains("'setup'"));
    }

    #[test]
    fn test_host_namespaces() {
        let d = doc(
            r#"
kind: Pod
spec:
  hostPID: true
  hostIPC: true
  containers:
    - name: web
"#,
        );
        let violations = HostNamespaces.inspect(&d);
        assert_eq!(violations.len(), 2);
        assert_eq!(violations[0].path.to_string(), "spec.hostPID");
        assert_eq!(violations[1].path.to_string(), "spec.hostIPC");
    }

    #[test]
    fn test_non_workload_is_ignored() {
        let d = doc("kind: ConfigMap\ndata:\n  k: v\n");
        assert!(NonRootUser.inspect(&d).is_empty());
        assert!(HostNamespaces.inspect(&d).is_empty());
    }
}
