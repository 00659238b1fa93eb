//! Parsed manifest documents and the per-run document set.
//!
//! A [`Document`] is one manifest out of an input stream: its normalized
//! [`Node`] tree plus reporting metadata (kind, name, namespace, origin)
//! extracted best-effort at construction. A [`DocumentSet`] is the ordered
//! collection a single run works on; cross-document rules receive it
//! whole, along with a kind index built once up front.

mod loader;
mod node;
mod path;

pub use loader::{
    LoadOutcome, ParseFailure, STDIN_ORIGIN, SourceFormat, load_paths, load_stdin, parse_content,
};
pub use node::{Node, Scalar, Walk};
pub use path::{Path, PathParseError, Step};

use std::collections::HashMap;
use std::fmt;

/// Identity of a document within one run: its position in the input set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(pub usize);

/// Reporting identity of a document. All manifest-derived fields are
/// best-effort; a document with no `kind` still evaluates (rules that
/// filter on kind simply skip it).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentRef {
    pub kind: Option<String>,
    pub api_version: Option<String>,
    pub name: Option<String>,
    pub namespace: Option<String>,
    /// File path or `<stdin>`.
    pub origin: String,
    /// 0-based position within the origin's document stream.
    pub position: usize,
}

impl DocumentRef {
    /// Short human identity: `Deployment prod/web`, or a positional
    /// fallback when the manifest carries no kind.
    pub fn describe(&self) -> String {
        match (&self.kind, &self.name) {
            (Some(kind), Some(name)) => match &self.namespace {
                Some(ns) => format!("{} {}/{}", kind, ns, name),
                None => format!("{} {}", kind, name),
            },
            (Some(kind), None) => format!("{} (unnamed)", kind),
            (None, _) => format!("document #{}", self.position + 1),
        }
    }

    /// Where the document came from: `app.yaml`, or `app.yaml (doc 3)`
    /// for later documents in a multi-document stream.
    pub fn location(&self) -> String {
        if self.position == 0 {
            self.origin.clone()
        } else {
            format!("{} (doc {})", self.origin, self.position + 1)
        }
    }
}

impl fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.describe())
    }
}

/// One parsed manifest.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    root: Node,
    reference: DocumentRef,
}

impl Document {
    /// Wrap a parsed tree, extracting reporting metadata.
    pub fn new(root: Node, origin: impl Into<String>, position: usize) -> Self {
        let text = |node: Option<&Node>| node.and_then(Node::as_str).map(str::to_string);
        let reference = DocumentRef {
            kind: text(root.get("kind")),
            api_version: text(root.get("apiVersion")),
            name: text(root.at("metadata.name")),
            namespace: text(root.at("metadata.namespace")),
            origin: origin.into(),
            position,
        };
        Self { root, reference }
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn reference(&self) -> &DocumentRef {
        &self.reference
    }

    pub fn kind(&self) -> Option<&str> {
        self.reference.kind.as_deref()
    }

    pub fn name(&self) -> Option<&str> {
        self.reference.name.as_deref()
    }

    pub fn namespace(&self) -> Option<&str> {
        self.reference.namespace.as_deref()
    }

    /// Look up a node by path.
    pub fn get(&self, path: &Path) -> Option<&Node> {
        self.root.lookup(path)
    }

    /// Look up a node by dotted path string.
    pub fn get_at(&self, dotted: &str) -> Option<&Node> {
        self.root.at(dotted)
    }

    /// `metadata.annotations`, when present and a mapping.
    pub fn annotations(&self) -> Option<&Node> {
        self.get_at("metadata.annotations")
    }

    /// `metadata.labels`, when present and a mapping.
    pub fn labels(&self) -> Option<&Node> {
        self.get_at("metadata.labels")
    }
}

/// The ordered collection of documents a run evaluates.
#[derive(Debug, Default)]
pub struct DocumentSet {
    documents: Vec<Document>,
    by_kind: HashMap<String, Vec<DocumentId>>,
}

impl DocumentSet {
    pub fn new(documents: Vec<Document>) -> Self {
        let mut by_kind: HashMap<String, Vec<DocumentId>> = HashMap::new();
        for (index, document) in documents.iter().enumerate() {
            if let Some(kind) = document.kind() {
                by_kind
                    .entry(kind.to_string())
                    .or_default()
                    .push(DocumentId(index));
            }
        }
        Self { documents, by_kind }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn get(&self, id: DocumentId) -> Option<&Document> {
        self.documents.get(id.0)
    }

    /// All documents in input order.
    pub fn iter(&self) -> impl Iterator<Item = (DocumentId, &Document)> {
        self.documents
            .iter()
            .enumerate()
            .map(|(index, document)| (DocumentId(index), document))
    }

    /// Documents of one kind, in input order.
    pub fn of_kind<'a>(&'a self, kind: &str) -> impl Iterator<Item = (DocumentId, &'a Document)> {
        self.by_kind
            .get(kind)
            .map(|ids| ids.as_slice())
            .unwrap_or(&[])
            .iter()
            .filter_map(|id| self.get(*id).map(|document| (*id, document)))
    }

    /// Label-selector matching: every key/value pair in `selector` must be
    /// present in `labels` (compared as text, the way Kubernetes treats
    /// label values). An empty selector matches everything.
    pub fn selector_matches(selector: &Node, labels: Option<&Node>) -> bool {
        let Some(entries) = selector.as_mapping() else {
            return false;
        };
        entries.iter().all(|(key, wanted)| {
            labels
                .and_then(|l| l.get(key))
                .and_then(Node::as_text)
                .is_some_and(|actual| Some(actual) == wanted.as_text())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(yaml: &str) -> Document {
        let value: serde_yaml::Value = serde_yaml::from_str(yaml).unwrap();
        Document::new(Node::from_yaml(value).unwrap(), "test.yaml", 0)
    }

    #[test]
    fn test_metadata_extraction() {
        let d = doc(
            r#"
apiVersion: apps/v1
kind: Deployment
metadata:
  name: web
  namespace: prod
"#,
        );
        assert_eq!(d.kind(), Some("Deployment"));
        assert_eq!(d.name(), Some("web"));
        assert_eq!(d.namespace(), Some("prod"));
        assert_eq!(d.reference().describe(), "Deployment prod/web");
    }

    #[test]
    fn test_metadata_is_optional() {
        let d = doc("data:\n  key: value\n");
        assert_eq!(d.kind(), None);
        assert_eq!(d.reference().describe(), "document #1");
    }

    #[test]
    fn test_kind_index() {
        let docs = vec![
            doc("kind: Deployment\nmetadata:\n  name: a\n"),
            doc("kind: Service\nmetadata:\n  name: b\n"),
            doc("kind: Deployment\nmetadata:\n  name: c\n"),
        ];
        let set = DocumentSet::new(docs);
        let names: Vec<_> = set
            .of_kind("Deployment")
            .map(|(_, d)| d.name().unwrap())
            .collect();
        assert_eq!(names, vec!["a", "c"]);
        assert_eq!(set.of_kind("CronJob").count(), 0);
    }

    #[test]
    fn test_selector_matching() {
        let selector = doc("app: web\ntier: frontend\n");
        let labels = doc("app: web\ntier: frontend\nextra: fine\n");
        assert!(DocumentSet::selector_matches(
            selector.root(),
            Some(labels.root())
        ));

        let partial = doc("app: web\n");
        assert!(!DocumentSet::selector_matches(
            selector.root(),
            Some(partial.root())
        ));
        assert!(!DocumentSet::selector_matches(selector.root(), None));
    }

    #[test]
    fn test_selector_compares_as_text() {
        // YAML types the version label as an integer; selectors still match.
        let selector = doc("version: \"2\"\n");
        let labels = doc("version: 2\n");
        assert!(DocumentSet::selector_matches(
            selector.root(),
            Some(labels.root())
        ));
    }
}
