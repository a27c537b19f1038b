//! Node label sets.
//!
//! Labels are kept in first-occurrence order so that rendered Cypher and
//! wire payloads are deterministic, while membership and equality follow
//! set semantics.

use serde::Serialize;

use crate::error::{NeonError, NeonResult};
use crate::table::Cell;
use crate::value::Value;

/// An insertion-ordered, de-duplicated collection of node labels.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct LabelSet {
    labels: Vec<String>,
}

impl LabelSet {
    /// Create an empty label set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize a raw value into a label set.
    ///
    /// Accepts a single string, a list of strings, or null (the empty set).
    pub fn conform(value: &Value) -> NeonResult<Self> {
        match value {
            Value::Null => Ok(Self::new()),
            Value::String(s) => Ok(Self::from(s.as_str())),
            Value::List(items) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s.clone()),
                    other => Err(NeonError::conformance("a label", other)),
                })
                .collect(),
            other => Err(NeonError::conformance("a label set", other)),
        }
    }

    /// Normalize a table cell into a label set. Cells that already hold
    /// labels pass through unchanged.
    pub fn conform_cell(cell: &Cell) -> NeonResult<Self> {
        match cell {
            Cell::Labels(labels) => Ok(labels.clone()),
            Cell::Value(value) => Self::conform(value),
            Cell::Node(node) => Err(NeonError::conformance("a label set", node)),
        }
    }

    /// Set union; labels of `self` keep their position, new labels of
    /// `other` follow in their own order.
    pub fn union(&self, other: &LabelSet) -> LabelSet {
        self.iter().chain(other.iter()).collect()
    }

    /// True if the two sets share at least one label.
    pub fn intersects(&self, other: &LabelSet) -> bool {
        let (small, large) = if self.len() <= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        small.iter().any(|label| large.contains(label))
    }

    pub fn contains(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.labels.clone()
    }

    fn insert(&mut self, label: String) {
        if !self.contains(&label) {
            self.labels.push(label);
        }
    }
}

impl PartialEq for LabelSet {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|label| other.contains(label))
    }
}

impl Eq for LabelSet {}

impl<S: Into<String>> FromIterator<S> for LabelSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = LabelSet::new();
        for label in iter {
            set.insert(label.into());
        }
        set
    }
}

impl From<&str> for LabelSet {
    fn from(label: &str) -> Self {
        std::iter::once(label).collect()
    }
}

impl<const N: usize> From<[&str; N]> for LabelSet {
    fn from(labels: [&str; N]) -> Self {
        labels.into_iter().collect()
    }
}
