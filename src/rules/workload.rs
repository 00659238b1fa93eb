//! Pod-spec extraction helpers.
//!
//! Workload kinds embed their pod spec at different depths: Deployments
//! and friends under `spec.template.spec`, CronJobs under
//! `spec.jobTemplate.spec.template.spec`, bare Pods directly under
//! `spec`. Rules work against the real location so findings carry paths
//! that exist in the document at hand.

use crate::document::{Document, Node, Path};

/// Candidate pod-spec locations, most specific first.
const POD_SPEC_LOCATIONS: &[&str] = &[
    "spec.template.spec",
    "spec.jobTemplate.spec.template.spec",
    "spec",
];

/// Pod-template label locations, paired with [`POD_SPEC_LOCATIONS`].
const POD_LABEL_LOCATIONS: &[&str] = &[
    "spec.template.metadata.labels",
    "spec.jobTemplate.spec.template.metadata.labels",
];

/// Locate the pod spec in a workload document: the first candidate
/// location holding a mapping with a `containers` key.
pub fn pod_spec(document: &Document) -> Option<(Path, &Node)> {
    for location in POD_SPEC_LOCATIONS {
        let Ok(path) = location.parse::<Path>() else {
            continue;
        };
        if let Some(node) = document.get(&path) {
            if node.get("containers").is_some() {
                return Some((path, node));
            }
        }
    }
    None
}

/// Regular containers with their absolute paths.
pub fn containers(document: &Document) -> Vec<(Path, &Node)> {
    list_containers(document, &["containers"])
}

/// Regular and init containers with their absolute paths. Probe rules
/// only look at regular containers; security, resource and image rules
/// cover init containers too.
pub fn all_containers(document: &Document) -> Vec<(Path, &Node)> {
    list_containers(document, &["containers", "initContainers"])
}

fn list_containers<'a>(document: &'a Document, fields: &[&'static str]) -> Vec<(Path, &'a Node)> {
    let Some((base, spec)) = pod_spec(document) else {
        return Vec::new();
    };
    let mut found = Vec::new();
    for field in fields {
        if let Some(items) = spec.get(field).and_then(Node::as_sequence) {
            for (index, container) in items.iter().enumerate() {
                found.push((base.clone().key(*field).index(index), container));
            }
        }
    }
    found
}

/// Container name for messages; containers are required to have one, but
/// a half-written manifest may not.
pub fn container_name(container: &Node) -> &str {
    container.get("name").and_then(Node::as_str).unwrap_or("<unnamed>")
}

/// The labels a pod selector would match: the pod template's labels, or
/// the document's own labels for bare Pods. Returns the location too so
/// findings can point at it.
pub fn pod_template_labels(document: &Document) -> Option<(Path, &Node)> {
    for location in POD_LABEL_LOCATIONS {
        let Ok(path) = location.parse::<Path>() else {
            continue;
        };
        if let Some(labels) = document.get(&path) {
            return Some((path, labels));
        }
    }
    if document.kind() == Some("Pod") {
        if let Some(labels) = document.labels() {
            let Ok(path) = "metadata.labels".parse::<Path>() else {
                return None;
            };
            return Some((path, labels));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(yaml: &str) -> Document {
        let value: serde_yaml::Value = serde_yaml::from_str(yaml).unwrap();
        Document::new(Node::from_yaml(value).unwrap(), "test.yaml", 0)
    }

    #[test]
    fn test_pod_spec_in_deployment() {
        let d = doc(
            r#"
kind: Deployment
spec:
  template:
    spec:
      containers:
        - name: web
"#,
        );
        let (path, _) = pod_spec(&d).unwrap();
        assert_eq!(path.to_string(), "spec.template.spec");
    }

    #[test]
    fn test_pod_spec_in_cronjob() {
        let d = doc(
            r#"
kind: CronJob
spec:
  jobTemplate:
    spec:
      template:
        spec:
          containers:
            - name: task
"#,
        );
        let (path, _) = pod_spec(&d).unwrap();
        assert_eq!(path.to_string(), "spec.jobTemplate.spec.template.spec");
    }

    #[test]
    fn test_pod_spec_in_bare_pod() {
        let d = doc(
            r#"
kind: Pod
spec:
  containers:
    - name: web
"#,
        );
        let (path, _) = pod_spec(&d).unwrap();
        assert_eq!(path.to_string(), "spec");
    }

    #[test]
    fn test_no_pod_spec_in_service() {
        let d = doc("kind: Service\nspec:\n  selector:\n    app: web\n");
        assert!(pod_spec(&d).is_none());
        assert!(containers(&d).is_empty());
    }

    #[test]
    fn test_all_containers_includes_init() {
        let d = doc(
            r#"
kind: Pod
spec:
  containers:
    - name: web
    - name: sidecar
  initContainers:
    - name: setup
"#,
        );
        let regular = containers(&d);
        assert_eq!(regular.len(), 2);
        assert_eq!(regular[0].0.to_string(), "spec.containers[0]");

        let all = all_containers(&d);
        assert_eq!(all.len(), 3);
        assert_eq!(all[2].0.to_string(), "spec.initContainers[0]");
        assert_eq!(container_name(all[2].1), "setup");
    }

    #[test]
    fn test_pod_template_labels() {
        let d = doc(
            r#"
kind: Deployment
spec:
  template:
    metadata:
      labels:
        app: web
    spec:
      containers: []
"#,
        );
        let (path, labels) = pod_template_labels(&d).unwrap();
        assert_eq!(path.to_string(), "spec.template.metadata.labels");
        assert_eq!(labels.get("app").and_then(Node::as_str), Some("web"));

        let pod = doc("kind: Pod\nmetadata:\n  labels:\n    app: web\n");
        let (path, _) = pod_template_labels(&pod).unwrap();
        assert_eq!(path.to_string(), "metadata.labels");
    }
}
