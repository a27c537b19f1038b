//! Label enrichment parameters shared by node and edge frames.

use crate::error::{NeonError, NeonResult};
use crate::labels::LabelSet;
use crate::table::Table;

/// Where a frame's per-row labels come from: a column whose values are
/// conformed into label sets, a static set applied to every row, or both
/// (unioned per row, static labels first).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelSpec {
    column: Option<String>,
    labels: Option<LabelSet>,
}

impl LabelSpec {
    /// Labels read from a column.
    pub fn column(name: impl Into<String>) -> Self {
        Self {
            column: Some(name.into()),
            labels: None,
        }
    }

    /// The same labels for every row.
    pub fn fixed(labels: impl Into<LabelSet>) -> Self {
        Self {
            column: None,
            labels: Some(labels.into()),
        }
    }

    /// Add a label column to this spec.
    pub fn and_column(mut self, name: impl Into<String>) -> Self {
        self.column = Some(name.into());
        self
    }

    /// Add static labels to this spec.
    pub fn and_labels(mut self, labels: impl Into<LabelSet>) -> Self {
        self.labels = Some(labels.into());
        self
    }

    pub fn column_name(&self) -> Option<&str> {
        self.column.as_deref()
    }

    pub fn static_labels(&self) -> Option<&LabelSet> {
        self.labels.as_ref()
    }

    /// True when neither a column nor static labels were given.
    pub fn is_empty(&self) -> bool {
        self.column.is_none() && self.labels.is_none()
    }

    /// Compute one label set per table row.
    pub fn resolve(&self, table: &Table) -> NeonResult<Vec<LabelSet>> {
        match (&self.column, &self.labels) {
            (None, None) => Err(NeonError::MissingLabelSpecification),
            (None, Some(fixed)) => Ok(vec![fixed.clone(); table.len()]),
            (Some(column), fixed) => table
                .column(column)?
                .map(|cell| {
                    let row_labels = LabelSet::conform_cell(cell)?;
                    Ok(match fixed {
                        Some(fixed) => fixed.union(&row_labels),
                        None => row_labels,
                    })
                })
                .collect(),
        }
    }
}
