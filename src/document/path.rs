//! Paths into a document tree.
//!
//! A `Path` names one location in a parsed manifest, e.g.
//! `spec.containers[0].resources.limits.cpu`. Findings carry paths so a
//! reader can jump straight to the offending field.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One step from a node to one of its children.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Step {
    /// Mapping key.
    Key(String),
    /// Sequence index (0-based).
    Index(usize),
}

/// A path from the document root to a node.
///
/// The root path is empty and renders as an empty string. Ordering is
/// structural, which gives deterministic sorts without going through the
/// rendered form.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Path {
    steps: Vec<Step>,
}

impl Path {
    /// The empty path addressing the document root.
    pub fn root() -> Self {
        Self::default()
    }

    /// Whether this path addresses the document root.
    pub fn is_root(&self) -> bool {
        self.steps.is_empty()
    }

    /// The steps making up this path.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Append a mapping key.
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.steps.push(Step::Key(key.into()));
        self
    }

    /// Append a sequence index.
    pub fn index(mut self, index: usize) -> Self {
        self.steps.push(Step::Index(index));
        self
    }

    pub(crate) fn push(&mut self, step: Step) {
        self.steps.push(step);
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            match step {
                Step::Key(key) => {
                    if i > 0 {
                        write!(f, ".")?;
                    }
                    write!(f, "{}", key)?;
                }
                Step::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}

/// Error produced when a dotted path string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid path '{input}': {reason}")]
pub struct PathParseError {
    input: String,
    reason: &'static str,
}

impl PathParseError {
    fn new(input: &str, reason: &'static str) -> Self {
        Self {
            input: input.to_string(),
            reason,
        }
    }
}

impl FromStr for Path {
    type Err = PathParseError;

    /// Parse the rendered form back into a path. Keys containing `.`,
    /// `[` or `]` cannot be expressed in the dotted syntax.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut path = Path::root();
        if s.is_empty() {
            return Ok(path);
        }
        for (position, segment) in s.split('.').enumerate() {
            let (key, rest) = match segment.find('[') {
                Some(pos) => segment.split_at(pos),
                None => (segment, ""),
            };
            if key.is_empty() {
                // "[0]" is only valid as the leading segment, for the rare
                // document whose root is a sequence.
                if !(position == 0 && rest.starts_with('[')) {
                    return Err(PathParseError::new(s, "empty key segment"));
                }
            } else {
                path.push(Step::Key(key.to_string()));
            }
            let mut remaining = rest;
            while !remaining.is_empty() {
                let inner = remaining
                    .strip_prefix('[')
                    .ok_or_else(|| PathParseError::new(s, "expected '['"))?;
                let end = inner
                    .find(']')
                    .ok_or_else(|| PathParseError::new(s, "unclosed index"))?;
                let digits = &inner[..end];
                let index: usize = digits
                    .parse()
                    .map_err(|_| PathParseError::new(s, "index is not a number"))?;
                path.push(Step::Index(index));
                remaining = &inner[end + 1..];
            }
        }
        Ok(path)
    }
}
