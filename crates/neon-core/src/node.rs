//! Identity-bearing references to graph nodes.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::cypher;
use crate::labels::LabelSet;
use crate::value::Value;

/// Default query variable used in rendered patterns.
pub const DEFAULT_VAR: &str = "n";

/// A graph node as referenced from a table row: its labels plus the single
/// key/value pair needed to MATCH it.
///
/// Equality is deliberately loose: two refs are equal when their identity
/// pairs match and their label sets share at least one label. This relation
/// is not transitive, so `NodeRef` is neither `Eq` nor `Hash`. Use
/// [`NodeRef::same_as`] for strict structural comparison.
#[derive(Debug, Clone, Serialize)]
pub struct NodeRef {
    labels: LabelSet,
    key: String,
    value: Value,
    var: String,
}

impl NodeRef {
    pub fn new(labels: LabelSet, key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            labels,
            key: key.into(),
            value: value.into(),
            var: DEFAULT_VAR.to_string(),
        }
    }

    /// Use a different query variable when rendering.
    pub fn with_var(mut self, var: impl Into<String>) -> Self {
        self.var = var.into();
        self
    }

    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    pub fn var(&self) -> &str {
        &self.var
    }

    /// The minimal key/value pair sufficient to match this node.
    pub fn identity(&self) -> (&str, &Value) {
        (&self.key, &self.value)
    }

    /// The identity as a single-entry property map, as sent on the wire.
    pub fn identity_map(&self) -> BTreeMap<String, Value> {
        BTreeMap::from([(self.key.clone(), self.value.clone())])
    }

    /// Render a pattern fragment such as `(n:Person {name: "Ada"})`.
    ///
    /// `limit_labels` keeps only the first N labels; `var` overrides the
    /// stored query variable.
    pub fn match_pattern(&self, limit_labels: Option<usize>, var: Option<&str>) -> String {
        format!(
            "({}{} {{{}: {}}})",
            var.unwrap_or(&self.var),
            cypher::format_labels(&self.labels, limit_labels),
            cypher::quote_identifier(&self.key),
            cypher::literal(&self.value)
        )
    }

    /// Strict structural equality: same labels (as sets), key, value and
    /// variable.
    pub fn same_as(&self, other: &NodeRef) -> bool {
        self.key == other.key
            && self.value == other.value
            && self.var == other.var
            && self.labels == other.labels
    }
}

impl PartialEq for NodeRef {
    fn eq(&self, other: &Self) -> bool {
        self.identity() == other.identity() && self.labels.intersects(&other.labels)
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.match_pattern(None, None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_pattern() {
        let node = NodeRef::new(LabelSet::from("Person"), "name", "Ada");
        assert_eq!(node.match_pattern(None, None), "(n:Person {name: \"Ada\"})");
        assert_eq!(node.to_string(), "(n:Person {name: \"Ada\"})");
    }

    #[test]
    fn test_match_pattern_without_labels() {
        let node = NodeRef::new(LabelSet::new(), "name", "Ada");
        assert_eq!(node.match_pattern(None, None), "(n {name: \"Ada\"})");
    }

    #[test]
    fn test_match_pattern_limit_and_var() {
        let node = NodeRef::new(LabelSet::from(["Person", "Customer", "Vip"]), "id", 42i64);
        assert_eq!(node.match_pattern(Some(1), Some("p")), "(p:Person {id: 42})");
        assert_eq!(node.clone().with_var("c").match_pattern(Some(2), None), "(c:Person:Customer {id: 42})");
    }

    #[test]
    fn test_equality_requires_shared_label() {
        let a = NodeRef::new(LabelSet::from(["A", "B"]), "id", 1i64);
        let b = NodeRef::new(LabelSet::from(["B", "C"]), "id", 1i64);
        let c = NodeRef::new(LabelSet::from("A"), "id", 1i64);
        let d = NodeRef::new(LabelSet::from("C"), "id", 1i64);
        assert_eq!(a, b);
        assert_ne!(c, d);
    }

    #[test]
    fn test_equality_requires_same_identity() {
        let a = NodeRef::new(LabelSet::from("A"), "id", 1i64);
        let b = NodeRef::new(LabelSet::from("A"), "id", 2i64);
        let c = NodeRef::new(LabelSet::from("A"), "key", 1i64);
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_same_as_is_strict() {
        let a = NodeRef::new(LabelSet::from(["A", "B"]), "id", 1i64);
        let b = NodeRef::new(LabelSet::from(["B", "C"]), "id", 1i64);
        assert!(!a.same_as(&b));
        assert!(a.same_as(&a.clone()));
    }

    #[test]
    fn test_identity_map() {
        let node = NodeRef::new(LabelSet::from("A"), "id", 1i64);
        assert_eq!(node.identity(), ("id", &Value::Integer(1)));
        assert_eq!(node.identity_map().get("id"), Some(&Value::Integer(1)));
    }
}
