//! The normalized document tree.
//!
//! Parsed manifests are held as a closed `Node` variant: mappings keep
//! their keys in source order, sequences keep element order, scalars carry
//! the usual YAML/JSON scalar kinds. Nodes are immutable once built;
//! everything downstream works on shared references.

use crate::document::path::{Path, Step};
use std::fmt;

/// A scalar leaf value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl Scalar {
    /// Render the scalar the way a label or annotation value reads,
    /// regardless of how YAML typed it. `None` for null.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::String(s) => Some(s.clone()),
            Self::Integer(i) => Some(i.to_string()),
            Self::Float(f) => Some(f.to_string()),
            Self::Bool(b) => Some(b.to_string()),
            Self::Null => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "{}", s),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Float(v) => write!(f, "{}", v),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Null => write!(f, "null"),
        }
    }
}

/// One node in a parsed document.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Key-value pairs in source order. Keys are unique.
    Mapping(Vec<(String, Node)>),
    /// Ordered elements.
    Sequence(Vec<Node>),
    /// Leaf value.
    Scalar(Scalar),
}

impl Node {
    /// Look up a key in a mapping node.
    pub fn get(&self, key: &str) -> Option<&Node> {
        match self {
            Self::Mapping(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Look up an element in a sequence node.
    pub fn index(&self, index: usize) -> Option<&Node> {
        match self {
            Self::Sequence(items) => items.get(index),
            _ => None,
        }
    }

    /// Follow a path from this node. `None` when any step is absent or
    /// lands on the wrong node kind.
    pub fn lookup(&self, path: &Path) -> Option<&Node> {
        let mut node = self;
        for step in path.steps() {
            node = match step {
                Step::Key(key) => node.get(key)?,
                Step::Index(index) => node.index(*index)?,
            };
        }
        Some(node)
    }

    /// Convenience lookup with the dotted path syntax. `None` when the
    /// path is absent or the string does not parse.
    pub fn at(&self, dotted: &str) -> Option<&Node> {
        let path: Path = dotted.parse().ok()?;
        self.lookup(&path)
    }

    /// String scalar value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Scalar(Scalar::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Integer scalar value.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Scalar(Scalar::Integer(i)) => Some(*i),
            _ => None,
        }
    }

    /// Boolean scalar value.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Scalar(Scalar::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    /// Scalar rendered as text (labels, annotations, image refs).
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Scalar(scalar) => scalar.as_text(),
            _ => None,
        }
    }

    /// Mapping entries in source order.
    pub fn as_mapping(&self) -> Option<&[(String, Node)]> {
        match self {
            Self::Mapping(entries) => Some(entries),
            _ => None,
        }
    }

    /// Sequence elements.
    pub fn as_sequence(&self) -> Option<&[Node]> {
        match self {
            Self::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Scalar(Scalar::Null))
    }

    /// Lazy pre-order traversal of this subtree, root included. Mapping
    /// children come out in source order, sequence children in index
    /// order; each call starts a fresh single-pass iterator.
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            stack: vec![(Path::root(), self)],
        }
    }

    /// All nodes in this subtree matching `predicate`, paired with their
    /// paths relative to this node. Traversal order as in [`walk`].
    ///
    /// [`walk`]: Node::walk
    pub fn find<'a, P>(&'a self, mut predicate: P) -> impl Iterator<Item = (Path, &'a Node)>
    where
        P: FnMut(&Node) -> bool + 'a,
    {
        self.walk().filter(move |(_, node)| predicate(node))
    }
}

/// Iterator behind [`Node::walk`].
pub struct Walk<'a> {
    stack: Vec<(Path, &'a Node)>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = (Path, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        let (path, node) = self.stack.pop()?;
        match node {
            Node::Mapping(entries) => {
                for (key, child) in entries.iter().rev() {
                    let mut child_path = path.clone();
                    child_path.push(Step::Key(key.clone()));
                    self.stack.push((child_path, child));
                }
            }
            Node::Sequence(items) => {
                for (index, child) in items.iter().enumerate().rev() {
                    let mut child_path = path.clone();
                    child_path.push(Step::Index(index));
                    self.stack.push((child_path, child));
                }
            }
            Node::Scalar(_) => {}
        }
        Some((path, node))
    }
}

impl Node {
    /// Convert a parsed YAML value. Fails on mapping keys that are not
    /// scalars and on keys that collide after rendering to text (YAML
    /// would otherwise let `1` and `"1"` coexist).
    pub(crate) fn from_yaml(value: serde_yaml::Value) -> Result<Node, String> {
        match value {
            serde_yaml::Value::Null => Ok(Node::Scalar(Scalar::Null)),
            serde_yaml::Value::Bool(b) => Ok(Node::Scalar(Scalar::Bool(b))),
            serde_yaml::Value::Number(n) => Ok(Node::Scalar(number_from_yaml(&n))),
            serde_yaml::Value::String(s) => Ok(Node::Scalar(Scalar::String(s))),
            serde_yaml::Value::Sequence(items) => {
                let mut converted = Vec::with_capacity(items.len());
                for item in items {
                    converted.push(Node::from_yaml(item)?);
                }
                Ok(Node::Sequence(converted))
            }
            serde_yaml::Value::Mapping(mapping) => {
                let mut entries: Vec<(String, Node)> = Vec::with_capacity(mapping.len());
                for (key, value) in mapping {
                    let key = yaml_key_text(&key)?;
                    if entries.iter().any(|(existing, _)| *existing == key) {
                        return Err(format!("duplicate mapping key '{}'", key));
                    }
                    entries.push((key, Node::from_yaml(value)?));
                }
                Ok(Node::Mapping(entries))
            }
            serde_yaml::Value::Tagged(tagged) => Node::from_yaml(tagged.value),
        }
    }

    /// Convert a parsed JSON value. JSON keys are always strings, so this
    /// cannot fail.
    pub(crate) fn from_json(value: serde_json::Value) -> Node {
        match value {
            serde_json::Value::Null => Node::Scalar(Scalar::Null),
            serde_json::Value::Bool(b) => Node::Scalar(Scalar::Bool(b)),
            serde_json::Value::Number(n) => Node::Scalar(number_from_json(&n)),
            serde_json::Value::String(s) => Node::Scalar(Scalar::String(s)),
            serde_json::Value::Array(items) => {
                Node::Sequence(items.into_iter().map(Node::from_json).collect())
            }
            serde_json::Value::Object(object) => Node::Mapping(
                object
                    .into_iter()
                    .map(|(key, value)| (key, Node::from_json(value)))
                    .collect(),
            ),
        }
    }
}

fn number_from_yaml(n: &serde_yaml::Number) -> Scalar {
    if let Some(i) = n.as_i64() {
        Scalar::Integer(i)
    } else {
        Scalar::Float(n.as_f64().unwrap_or(f64::NAN))
    }
}

fn number_from_json(n: &serde_json::Number) -> Scalar {
    if let Some(i) = n.as_i64() {
        Scalar::Integer(i)
    } else {
        Scalar::Float(n.as_f64().unwrap_or(f64::NAN))
    }
}

fn yaml_key_text(key: &serde_yaml::Value) -> Result<String, String> {
    match key {
        serde_yaml::Value::String(s) => Ok(s.clone()),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Null => Err("mapping key is null".to_string()),
        _ => Err("mapping key is not a scalar".to_string()),
    }
}
