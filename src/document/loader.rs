//! Manifest ingestion.
//!
//! Inputs are files, directories (walked recursively for manifest
//! extensions) or standard input. Multi-document YAML streams are split on
//! `---` separator lines with line-offset tracking, and every chunk parses
//! independently: one malformed document never takes down its siblings.

use crate::document::{Document, Node};
use log::{debug, warn};
use serde::Serialize;
use std::fs;
use std::io::Read;
use std::path::{Path as FsPath, PathBuf};
use walkdir::WalkDir;

/// Origin label used for documents read from standard input.
pub const STDIN_ORIGIN: &str = "<stdin>";

const MANIFEST_EXTENSIONS: &[&str] = &["yaml", "yml", "json"];

/// Input encoding selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceFormat {
    /// Decide per input: `.json` files parse as JSON, everything else
    /// (including stdin) as YAML.
    #[default]
    Auto,
    Yaml,
    Json,
}

impl SourceFormat {
    /// Parse a format name from a string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "auto" => Some(Self::Auto),
            "yaml" | "yml" => Some(Self::Yaml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    fn resolve(self, path: Option<&FsPath>) -> ResolvedFormat {
        match self {
            Self::Yaml => ResolvedFormat::Yaml,
            Self::Json => ResolvedFormat::Json,
            Self::Auto => match path.and_then(|p| p.extension()).and_then(|e| e.to_str()) {
                Some("json") => ResolvedFormat::Json,
                _ => ResolvedFormat::Yaml,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResolvedFormat {
    Yaml,
    Json,
}

/// A document (or input) that could not be parsed.
///
/// Parse failures are not findings: they surface as top-level diagnostics
/// in the report, and only force a non-zero exit when nothing at all
/// parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseFailure {
    /// File path or `<stdin>`.
    pub origin: String,
    /// Parser message.
    pub message: String,
    /// 1-based line within the origin, when the parser reported one.
    pub line: Option<usize>,
    /// 1-based column, when the parser reported one.
    pub column: Option<usize>,
}

impl ParseFailure {
    fn new(origin: &str, message: impl Into<String>) -> Self {
        Self {
            origin: origin.to_string(),
            message: message.into(),
            line: None,
            column: None,
        }
    }

    fn at(mut self, line: Option<usize>, column: Option<usize>) -> Self {
        self.line = line;
        self.column = column;
        self
    }
}

impl std::fmt::Display for ParseFailure {
    /// `origin:line:column: message`, omitting what the parser did not
    /// report.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.origin)?;
        if let Some(line) = self.line {
            write!(f, ":{}", line)?;
            if let Some(column) = self.column {
                write!(f, ":{}", column)?;
            }
        }
        write!(f, ": {}", self.message)
    }
}

/// Everything one load produced: parsed documents in input order plus the
/// failures encountered along the way.
#[derive(Debug, Default)]
pub struct LoadOutcome {
    pub documents: Vec<Document>,
    pub failures: Vec<ParseFailure>,
}

impl LoadOutcome {
    fn merge(&mut self, other: LoadOutcome) {
        self.documents.extend(other.documents);
        self.failures.extend(other.failures);
    }
}

/// Load manifests from the given paths. Directories are walked recursively
/// in sorted order, picking up `.yaml`, `.yml` and `.json` files;
/// explicitly named files load regardless of extension. An unreadable or
/// missing path becomes a [`ParseFailure`], not a hard error, so the rest
/// of the input set still evaluates.
pub fn load_paths(paths: &[PathBuf], format: SourceFormat) -> LoadOutcome {
    let mut outcome = LoadOutcome::default();
    for path in paths {
        if path.is_dir() {
            for file in manifest_files(path) {
                outcome.merge(load_file(&file, format));
            }
        } else {
            outcome.merge(load_file(path, format));
        }
    }
    outcome
}

/// Load manifests from standard input.
pub fn load_stdin(format: SourceFormat) -> std::io::Result<LoadOutcome> {
    let mut raw = String::new();
    std::io::stdin().read_to_string(&mut raw)?;
    Ok(parse_str(&raw, format.resolve(None), STDIN_ORIGIN))
}

/// Parse a raw manifest string as the given format. Exposed for library
/// callers and tests; `origin` only labels the resulting documents.
pub fn parse_content(raw: &str, format: SourceFormat, origin: &str) -> LoadOutcome {
    parse_str(raw, format.resolve(None), origin)
}

fn manifest_files(dir: &FsPath) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| MANIFEST_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
                .unwrap_or(false)
        })
        .collect();
    // sort_by_file_name orders siblings; a full sort keeps the cross-
    // directory order stable too.
    files.sort();
    debug!("discovered {} manifest file(s) under {}", files.len(), dir.display());
    files
}

fn load_file(path: &FsPath, format: SourceFormat) -> LoadOutcome {
    let origin = path.display().to_string();
    match fs::read_to_string(path) {
        Ok(raw) => parse_str(&raw, format.resolve(Some(path)), &origin),
        Err(e) => {
            warn!("skipping {}: {}", origin, e);
            LoadOutcome {
                documents: Vec::new(),
                failures: vec![ParseFailure::new(&origin, format!("cannot read file: {}", e))],
            }
        }
    }
}

fn parse_str(raw: &str, format: ResolvedFormat, origin: &str) -> LoadOutcome {
    let mut outcome = LoadOutcome::default();
    match format {
        ResolvedFormat::Json => parse_json(raw, origin, &mut outcome),
        ResolvedFormat::Yaml => parse_yaml_stream(raw, origin, &mut outcome),
    }
    debug!(
        "parsed {} document(s) from {} ({} failure(s))",
        outcome.documents.len(),
        origin,
        outcome.failures.len()
    );
    outcome
}

fn parse_json(raw: &str, origin: &str, outcome: &mut LoadOutcome) {
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(value) => {
            let root = Node::from_json(value);
            outcome.documents.push(Document::new(root, origin, 0));
        }
        Err(e) => {
            let (line, column) = (e.line(), e.column());
            outcome.failures.push(
                ParseFailure::new(origin, e.to_string()).at(
                    (line > 0).then_some(line),
                    (column > 0).then_some(column),
                ),
            );
        }
    }
}

fn parse_yaml_stream(raw: &str, origin: &str, outcome: &mut LoadOutcome) {
    let mut position = 0;
    for (start_line, chunk) in split_yaml_documents(raw) {
        if chunk.trim().is_empty() {
            continue;
        }
        match serde_yaml::from_str::<serde_yaml::Value>(&chunk) {
            Ok(serde_yaml::Value::Null) => {
                // An explicit `null` document carries nothing to check.
                continue;
            }
            Ok(value) => match Node::from_yaml(value) {
                Ok(root) => {
                    outcome.documents.push(Document::new(root, origin, position));
                    position += 1;
                }
                Err(message) => {
                    outcome
                        .failures
                        .push(ParseFailure::new(origin, message).at(Some(start_line), None));
                    position += 1;
                }
            },
            Err(e) => {
                let location = e.location();
                let line = location
                    .as_ref()
                    .map(|l| start_line + l.line().saturating_sub(1));
                let column = location.as_ref().map(|l| l.column());
                outcome
                    .failures
                    .push(ParseFailure::new(origin, e.to_string()).at(line, column));
                position += 1;
            }
        }
    }
}

/// Split a YAML stream on `---` separator lines, keeping the 1-based line
/// each chunk starts on so parser locations can be mapped back to the
/// original input.
fn split_yaml_documents(raw: &str) -> Vec<(usize, String)> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_start = 1;
    let mut line_number = 0;

    for line in raw.lines() {
        line_number += 1;
        let trimmed = line.trim_end();
        if trimmed == "---" || trimmed.starts_with("--- ") {
            chunks.push((current_start, std::mem::take(&mut current)));
            current_start = line_number + 1;
            // Content after the separator belongs to the next document.
            if let Some(inline) = trimmed.strip_prefix("--- ") {
                current.push_str(inline);
                current.push('\n');
                current_start = line_number;
            }
            continue;
        }
        current.push_str(line);
        current.push('\n');
    }
    chunks.push((current_start, current));
    chunks
}
