//! Per-object rule waivers.
//!
//! An object can waive one rule for itself with an annotation whose value
//! is a free-form reason:
//!
//! ```yaml
//! metadata:
//!   annotations:
//!     ignore-rule.conformity.dev/SEC004: "writes a scratch cache to /"
//! ```
//!
//! Waived (document, rule) pairs are skipped before evaluation, so a
//! waiver silences exactly one rule on exactly one object. `INTERNAL`
//! findings cannot be waived.

use crate::document::{Document, Node};
use crate::types::INTERNAL_RULE_ID;

/// Annotation prefix for waiving a rule on one object.
pub const WAIVER_ANNOTATION_PREFIX: &str = "ignore-rule.conformity.dev/";

/// Rule ids waived on this document, in annotation order.
pub fn waived_rules(document: &Document) -> Vec<&str> {
    document
        .annotations()
        .and_then(Node::as_mapping)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|(key, _)| key.strip_prefix(WAIVER_ANNOTATION_PREFIX))
                .filter(|id| !id.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

/// Whether this document waives the given rule.
pub fn is_waived(document: &Document, rule_id: &str) -> bool {
    if rule_id == INTERNAL_RULE_ID {
        return false;
    }
    let key = format!("{}{}", WAIVER_ANNOTATION_PREFIX, rule_id);
    document
        .annotations()
        .is_some_and(|annotations| annotations.get(&key).is_some())
}
