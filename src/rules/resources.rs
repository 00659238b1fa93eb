//! Resource requirement rules.
//!
//! Memory is incompressible: a pod without a memory limit can take the
//! node down with it, and a request below the limit invites overcommit
//! kills. CPU is compressible, so the advice runs the other way around:
//! request it, do not limit it.

use crate::document::{Document, Node};
use crate::rules::{Rule, workload};
use crate::types::{Category, Severity, Violation};

/// All resource rules, in id order.
pub fn rules() -> Vec<Rule> {
    vec![
        Rule::document(
            "RES001",
            Category::Resources,
            Severity::Error,
            "Indicates when containers have no memory limit or no CPU request",
            ResourceLimitsSet,
        )
        .with_remediation("Set resources.limits.memory and resources.requests.cpu on every container."),
        Rule::document(
            "RES002",
            Category::Resources,
            Severity::Warning,
            "Indicates when a container's memory request differs from its limit",
            MemoryRequestsEqualLimits,
        )
        .with_remediation("Set resources.requests.memory equal to resources.limits.memory."),
        Rule::document(
            "RES003",
            Category::Resources,
            Severity::Info,
            "Indicates when containers set CPU limits, which cause throttling under load",
            CpuLimitSet,
        )
        .with_remediation("Drop resources.limits.cpu and rely on the CPU request for scheduling."),
    ]
}

struct ResourceLimitsSet;

impl super::DocumentCheck for ResourceLimitsSet {
    fn inspect(&self, document: &Document) -> Vec<Violation> {
        let mut violations = Vec::new();
        for (path, container) in workload::all_containers(document) {
            let name = workload::container_name(container);
            if container.at("resources.limits.memory").is_none() {
                violations.push(Violation::new(
                    path.clone().key("resources").key("limits").key("memory"),
                    format!("Container '{}' has no memory limit", name),
                ));
            }
            if container.at("resources.requests.cpu").is_none() {
                violations.push(Violation::new(
                    path.key("resources").key("requests").key("cpu"),
                    format!("Container '{}' has no CPU request", name),
                ));
            }
        }
        violations
    }
}

struct MemoryRequestsEqualLimits;

impl super::DocumentCheck for MemoryRequestsEqualLimits {
    fn inspect(&self, document: &Document) -> Vec<Violation> {
        let mut violations = Vec::new();
        for (path, container) in workload::all_containers(document) {
            let request = container.at("resources.requests.memory");
            let limit = container.at("resources.limits.memory");
            let (Some(request), Some(limit)) = (request, limit) else {
                continue;
            };
            let parsed = (quantity(request), quantity(limit));
            let (Some(requested), Some(limited)) = parsed else {
                continue;
            };
            if requested != limited {
                violations.push(Violation::new(
                    path.key("resources").key("requests").key("memory"),
                    format!(
                        "Container '{}' requests {} of memory but is limited to {}",
                        workload::container_name(container),
                        request.as_text().unwrap_or_default(),
                        limit.as_text().unwrap_or_default(),
                    ),
                ));
            }
        }
        violations
    }
}

struct CpuLimitSet;

impl super::DocumentCheck for CpuLimitSet {
    fn inspect(&self, document: &Document) -> Vec<Violation> {
        let mut violations = Vec::new();
        for (path, container) in workload::all_containers(document) {
            if container.at("resources.limits.cpu").is_some() {
                violations.push(Violation::new(
                    path.key("resources").key("limits").key("cpu"),
                    format!(
                        "Container '{}' sets a CPU limit",
                        workload::container_name(container)
                    ),
                ));
            }
        }
        violations
    }
}

fn quantity(node: &Node) -> Option<f64> {
    node.as_text().and_then(|text| parse_quantity(&text))
}

/// Kubernetes quantity suffixes. Binary suffixes must be tried before
/// their decimal one-letter prefixes.
const SUFFIXES: &[(&str, f64)] = &[
    ("Ki", 1024.0),
    ("Mi", 1024.0 * 1024.0),
    ("Gi", 1024.0 * 1024.0 * 1024.0),
    ("Ti", 1024.0 * 1024.0 * 1024.0 * 1024.0),
    ("Pi", 1024.0 * 1024.0 * 1024.0 * 1024.0 * 1024.0),
    ("Ei", 1024.0 * 1024.0 * 1024.0 * 1024.0 * 1024.0 * 1024.0),
    ("m", 1e-3),
    ("k", 1e3),
    ("M", 1e6),
    ("G", 1e9),
    ("T", 1e12),
    ("P", 1e15),
    ("E", 1e18),
];

/// Parse a Kubernetes quantity (`100m`, `128Mi`, `1G`, `0.5`, `100e6`)
/// into a plain number of base units.
pub(crate) fn parse_quantity(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    for (suffix, multiplier) in SUFFIXES {
        if let Some(number) = text.strip_suffix(suffix) {
            return number.parse::<f64>().ok().map(|value| value * multiplier);
        }
    }
    text.parse::<f64>().ok()
}
