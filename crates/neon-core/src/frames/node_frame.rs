//! Tables of graph nodes.

use tracing::debug;

use super::LabelSpec;
use crate::error::{NeonError, NeonResult};
use crate::labels::LabelSet;
use crate::node::NodeRef;
use crate::table::{Cell, Records, Table};

/// Reserved column holding each row's label set.
pub const LABELS_COLUMN: &str = "labels";

/// A batch of graph nodes: a table whose first column, once labelled, is
/// [`LABELS_COLUMN`], plus an optional identity column.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeFrame {
    table: Table,
    id_col: Option<String>,
}

impl NodeFrame {
    /// Wrap a table without labels or identity column.
    pub fn new(table: Table) -> Self {
        Self { table, id_col: None }
    }

    pub fn builder(table: Table) -> NodeFrameBuilder {
        NodeFrameBuilder {
            table,
            id_col: None,
            labels: LabelSpec::default(),
        }
    }

    /// Designate the identity column, or clear it with `None`.
    pub fn with_id_column(mut self, name: Option<&str>) -> NeonResult<Self> {
        if let Some(name) = name {
            if !self.table.has_column(name) {
                return Err(NeonError::column_not_found(name));
            }
        }
        self.id_col = name.map(str::to_string);
        Ok(self)
    }

    /// Build the `labels` column from `spec`. The source label column is
    /// consumed and any previous `labels` column is replaced.
    pub fn with_labels(mut self, spec: LabelSpec) -> NeonResult<Self> {
        let labels = spec.resolve(&self.table)?;

        if let Some(column) = spec.column_name() {
            self.table.drop_column(column)?;
            if self.id_col.as_deref() == Some(column) {
                debug!(column, "Identity column consumed as label column");
                self.id_col = None;
            }
        }
        if self.table.has_column(LABELS_COLUMN) {
            self.table.drop_column(LABELS_COLUMN)?;
        }

        let cells = labels.into_iter().map(Cell::Labels).collect();
        self.table.insert_column(0, LABELS_COLUMN, cells)?;
        Ok(self)
    }

    pub fn id_column(&self) -> Option<&str> {
        self.id_col.as_deref()
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn into_table(self) -> Table {
        self.table
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// The label set of one row, if the frame is labelled.
    pub fn labels(&self, row: usize) -> Option<&LabelSet> {
        self.table.cell(row, LABELS_COLUMN).and_then(Cell::as_labels)
    }

    /// True when the `labels` column exists. Empty label sets are allowed.
    pub fn is_upload_ready(&self) -> bool {
        self.table.has_column(LABELS_COLUMN)
    }

    /// One [`NodeRef`] per row, identified by `key` and the value found in
    /// `value_column` (or in a column named `key`).
    pub fn derive_identity_refs(&self, key: &str, value_column: Option<&str>) -> NeonResult<Vec<NodeRef>> {
        let column = value_column.unwrap_or(key);
        if !self.table.has_column(column) {
            return Err(NeonError::MissingValueColumn(column.to_string()));
        }

        self.table
            .column(column)?
            .enumerate()
            .map(|(row, cell)| {
                let value = cell
                    .as_value()
                    .ok_or_else(|| NeonError::conformance("an identity value", cell))?;
                let labels = self.labels(row).cloned().unwrap_or_default();
                Ok(NodeRef::new(labels, key, value.clone()))
            })
            .collect()
    }

    pub fn to_records(&self, drop_nulls: bool) -> Records<'_> {
        self.table.to_records(drop_nulls)
    }
}

/// Construction-time builder for [`NodeFrame`].
pub struct NodeFrameBuilder {
    table: Table,
    id_col: Option<String>,
    labels: LabelSpec,
}

impl NodeFrameBuilder {
    pub fn id_column(mut self, name: impl Into<String>) -> Self {
        self.id_col = Some(name.into());
        self
    }

    /// Read per-row labels from `name`.
    pub fn label_column(mut self, name: impl Into<String>) -> Self {
        self.labels = self.labels.and_column(name);
        self
    }

    /// Apply `labels` to every row (unioned with the label column if set).
    pub fn labels(mut self, labels: impl Into<LabelSet>) -> Self {
        self.labels = self.labels.and_labels(labels);
        self
    }

    /// Build the frame. Labels are only applied when a label column or
    /// static labels were given.
    pub fn build(self) -> NeonResult<NodeFrame> {
        let frame = NodeFrame::new(self.table).with_id_column(self.id_col.as_deref())?;
        if self.labels.is_empty() {
            Ok(frame)
        } else {
            frame.with_labels(self.labels)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Record;
    use crate::value::Value;

    fn people() -> Table {
        Table::from_records(vec![
            Record::new().with("name", "Ada").with("kind", "Person").with("email", Value::Null),
            Record::new().with("name", "Grace").with("kind", Value::from(vec!["Person", "Admiral"])),
        ])
    }

    #[test]
    fn test_labels_column_goes_first() {
        let frame = NodeFrame::builder(people()).label_column("kind").build().unwrap();
        assert_eq!(frame.table().columns()[0], LABELS_COLUMN);
        assert!(!frame.table().has_column("kind"));
        assert_eq!(frame.labels(1), Some(&LabelSet::from(["Person", "Admiral"])));
    }

    #[test]
    fn test_static_and_column_labels_union() {
        let frame = NodeFrame::builder(people())
            .label_column("kind")
            .labels("Imported")
            .build()
            .unwrap();
        assert_eq!(frame.labels(0), Some(&LabelSet::from(["Imported", "Person"])));
    }

    #[test]
    fn test_missing_label_specification() {
        let err = NodeFrame::new(people()).with_labels(LabelSpec::default()).unwrap_err();
        assert!(matches!(err, NeonError::MissingLabelSpecification));
    }

    #[test]
    fn test_upload_ready_after_set_labels() {
        let frame = NodeFrame::new(people());
        assert!(!frame.is_upload_ready());
        let frame = frame.with_labels(LabelSpec::fixed("Person")).unwrap();
        assert!(frame.is_upload_ready());
    }

    #[test]
    fn test_empty_labels_are_upload_ready() {
        let table = Table::from_records(vec![Record::new().with("kind", Value::Null)]);
        let frame = NodeFrame::builder(table).label_column("kind").build().unwrap();
        assert!(frame.is_upload_ready());
        assert!(frame.labels(0).unwrap().is_empty());
    }

    #[test]
    fn test_id_column_validation() {
        let frame = NodeFrame::builder(people()).id_column("name").build().unwrap();
        assert_eq!(frame.id_column(), Some("name"));

        let err = NodeFrame::builder(people()).id_column("nope").build().unwrap_err();
        assert!(matches!(err, NeonError::ColumnNotFound(_)));

        let cleared = frame.with_id_column(None).unwrap();
        assert_eq!(cleared.id_column(), None);
    }

    #[test]
    fn test_derive_identity_refs() {
        let frame = NodeFrame::builder(people()).label_column("kind").build().unwrap();
        let refs = frame.derive_identity_refs("name", None).unwrap();
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].to_string(), "(n:Person {name: \"Ada\"})");

        let refs = frame.derive_identity_refs("login", Some("name")).unwrap();
        assert_eq!(refs[1].identity(), ("login", &Value::from("Grace")));
    }

    #[test]
    fn test_derive_identity_refs_missing_column() {
        let frame = NodeFrame::new(people());
        assert!(matches!(
            frame.derive_identity_refs("id", None),
            Err(NeonError::MissingValueColumn(_))
        ));
        assert!(matches!(
            frame.derive_identity_refs("id", Some("nope")),
            Err(NeonError::MissingValueColumn(_))
        ));
    }

    #[test]
    fn test_label_column_consumes_identity_column() {
        let frame = NodeFrame::builder(people())
            .id_column("kind")
            .label_column("kind")
            .build()
            .unwrap();
        assert_eq!(frame.id_column(), None);
    }
}
