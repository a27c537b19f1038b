//! Tables of graph relationships.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;
use tracing::debug;

use super::{LabelSpec, NodeFrame};
use crate::error::{NeonError, NeonResult};
use crate::labels::LabelSet;
use crate::node::NodeRef;
use crate::table::{Cell, Records, Table};
use crate::value::Value;

/// Reserved column holding each row's relationship type.
pub const REL_TYPE_COLUMN: &str = "rel_type";

/// Number of leading rows inspected by [`EdgeFrame::has_resolved_endpoints`].
pub const RESOLUTION_SAMPLE: usize = 3;

const DEFAULT_START: &str = "start";
const DEFAULT_END: &str = "end";

/// Which side of a relationship an endpoint is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointRole {
    Start,
    End,
}

impl fmt::Display for EndpointRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndpointRole::Start => write!(f, "start"),
            EndpointRole::End => write!(f, "end"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Endpoint {
    column: String,
    key: String,
    label_column: Option<String>,
    labels: Option<LabelSet>,
}

impl Endpoint {
    fn new(column: String, key: Option<String>) -> Self {
        Self {
            key: key.unwrap_or_else(|| column.clone()),
            column,
            label_column: None,
            labels: None,
        }
    }
}

/// A batch of relationships. Each row has a start and end endpoint column
/// and, once typed, a leading [`REL_TYPE_COLUMN`]. Endpoints are resolved
/// when their raw identity values have been turned into [`NodeRef`]s.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeFrame {
    table: Table,
    start: Endpoint,
    end: Endpoint,
    shared_labels: Option<LabelSet>,
}

impl EdgeFrame {
    pub fn builder(table: Table) -> EdgeFrameBuilder {
        EdgeFrameBuilder {
            table,
            rel_type: None,
            start: DEFAULT_START.to_string(),
            end: DEFAULT_END.to_string(),
            start_key: None,
            end_key: None,
            start_label_column: None,
            end_label_column: None,
            start_labels: None,
            end_labels: None,
            shared_labels: None,
        }
    }

    /// Take relationship types from `column`, moving it to the front as
    /// [`REL_TYPE_COLUMN`].
    pub fn with_rel_type_column(mut self, column: &str) -> NeonResult<Self> {
        let values = self.table.drop_column(column)?;
        for value in &values {
            if !matches!(value, Cell::Value(Value::String(_))) {
                return Err(NeonError::conformance("a relationship type", value));
            }
        }
        self.set_rel_types(values)?;
        Ok(self)
    }

    /// Give every row the same relationship type.
    pub fn with_rel_type(mut self, rel_type: &str) -> NeonResult<Self> {
        let values = vec![Cell::from(rel_type); self.table.len()];
        self.set_rel_types(values)?;
        Ok(self)
    }

    fn set_rel_types(&mut self, values: Vec<Cell>) -> NeonResult<()> {
        if self.table.has_column(REL_TYPE_COLUMN) {
            self.table.drop_column(REL_TYPE_COLUMN)?;
        }
        self.table.insert_column(0, REL_TYPE_COLUMN, values)
    }

    fn endpoint(&self, role: EndpointRole) -> &Endpoint {
        match role {
            EndpointRole::Start => &self.start,
            EndpointRole::End => &self.end,
        }
    }

    fn has_label_input(&self) -> bool {
        self.shared_labels.is_some()
            || [&self.start, &self.end]
                .iter()
                .any(|e| e.label_column.is_some() || e.labels.is_some())
    }

    /// Per-row labels for one endpoint role. No label input yields empty sets.
    fn role_labels(&self, role: EndpointRole) -> NeonResult<Vec<LabelSet>> {
        let endpoint = self.endpoint(role);
        let fixed = match (&self.shared_labels, &endpoint.labels) {
            (Some(_), Some(_)) => return Err(NeonError::ConflictingLabelInput { role }),
            (Some(labels), None) | (None, Some(labels)) => Some(labels.clone()),
            (None, None) => None,
        };

        let spec = match (&endpoint.label_column, fixed) {
            (None, None) => return Ok(vec![LabelSet::new(); self.table.len()]),
            (Some(column), None) => LabelSpec::column(column),
            (None, Some(labels)) => LabelSpec::fixed(labels),
            (Some(column), Some(labels)) => LabelSpec::column(column).and_labels(labels),
        };
        spec.resolve(&self.table)
    }

    /// Replace raw identity values in both endpoint columns with node
    /// references built from the frame's label inputs. Cells already holding
    /// a node are kept; nulls stay null. Label columns are consumed.
    pub fn resolve_endpoints(mut self) -> NeonResult<Self> {
        let start_labels = self.role_labels(EndpointRole::Start)?;
        let end_labels = self.role_labels(EndpointRole::End)?;

        for (endpoint, labels) in [(&self.start, start_labels), (&self.end, end_labels)] {
            let cells = self
                .table
                .column(&endpoint.column)?
                .zip(labels)
                .map(|(cell, labels)| match cell {
                    Cell::Node(_) => Ok(cell.clone()),
                    _ if cell.is_null() => Ok(cell.clone()),
                    Cell::Value(value) => Ok(Cell::Node(NodeRef::new(labels, endpoint.key.clone(), value.clone()))),
                    Cell::Labels(_) => Err(NeonError::conformance("an endpoint identity value", cell)),
                })
                .collect::<NeonResult<Vec<_>>>()?;
            self.table.replace_column(&endpoint.column, cells)?;
        }

        let mut consumed: Vec<String> = Vec::new();
        for endpoint in [&mut self.start, &mut self.end] {
            if let Some(column) = endpoint.label_column.take() {
                if !consumed.contains(&column) {
                    consumed.push(column);
                }
            }
            endpoint.labels = None;
        }
        self.shared_labels = None;
        for column in &consumed {
            self.table.drop_column(column)?;
        }

        debug!(rows = self.table.len(), consumed = consumed.len(), "Resolved edge endpoints");
        Ok(self)
    }

    fn column_resolved(&self, column: &str, sample: Option<usize>) -> bool {
        match self.table.column(column) {
            Ok(cells) => cells
                .take(sample.unwrap_or(usize::MAX))
                .all(|cell| cell.as_node().is_some()),
            Err(_) => false,
        }
    }

    /// Sampling check: the first [`RESOLUTION_SAMPLE`] rows of both endpoint
    /// columns hold nodes. An empty frame counts as resolved.
    pub fn has_resolved_endpoints(&self) -> bool {
        self.column_resolved(&self.start.column, Some(RESOLUTION_SAMPLE))
            && self.column_resolved(&self.end.column, Some(RESOLUTION_SAMPLE))
    }

    /// Exhaustive check over every row.
    pub fn endpoints_fully_resolved(&self) -> bool {
        self.column_resolved(&self.start.column, None) && self.column_resolved(&self.end.column, None)
    }

    /// The first endpoint cell that is not a node, as `(column, row)`.
    pub fn first_unresolved(&self) -> Option<(&str, usize)> {
        (0..self.table.len()).find_map(|row| {
            [&self.start.column, &self.end.column]
                .into_iter()
                .find(|column| self.table.cell(row, column).and_then(Cell::as_node).is_none())
                .map(|column| (column.as_str(), row))
        })
    }

    pub fn has_rel_type(&self) -> bool {
        self.table.has_column(REL_TYPE_COLUMN)
    }

    /// A relationship type is present and every endpoint is resolved.
    pub fn is_upload_ready(&self) -> bool {
        self.has_rel_type() && self.endpoints_fully_resolved()
    }

    pub fn rel_type(&self, row: usize) -> Option<&str> {
        self.table
            .cell(row, REL_TYPE_COLUMN)
            .and_then(Cell::as_value)
            .and_then(Value::as_str)
    }

    pub fn start_column(&self) -> &str {
        &self.start.column
    }

    pub fn end_column(&self) -> &str {
        &self.end.column
    }

    pub fn start(&self, row: usize) -> Option<&NodeRef> {
        self.table.cell(row, &self.start.column).and_then(Cell::as_node)
    }

    pub fn end(&self, row: usize) -> Option<&NodeRef> {
        self.table.cell(row, &self.end.column).and_then(Cell::as_node)
    }

    /// Columns carried as relationship properties.
    pub fn property_columns(&self) -> impl Iterator<Item = &str> {
        self.table
            .columns()
            .iter()
            .map(String::as_str)
            .filter(move |c| *c != REL_TYPE_COLUMN && *c != self.start.column && *c != self.end.column)
    }

    /// Distinct endpoint values as a node frame: all start values, then all
    /// end values, first occurrence kept, in a single `id_col` column.
    pub fn to_node_frame(&self, id_col: &str, labels: Option<LabelSet>) -> NeonResult<NodeFrame> {
        let mut seen = HashSet::new();
        let cells: Vec<Cell> = self
            .table
            .column(&self.start.column)?
            .chain(self.table.column(&self.end.column)?)
            .filter(|cell| seen.insert(cell.raw_key()))
            .cloned()
            .collect();

        let mut table = Table::default();
        table.insert_column(0, id_col, cells)?;
        let frame = NodeFrame::new(table).with_id_column(Some(id_col))?;
        match labels {
            Some(labels) => frame.with_labels(LabelSpec::fixed(labels)),
            None => Ok(frame),
        }
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

    pub fn to_records(&self, drop_nulls: bool) -> Records<'_> {
        self.table.to_records(drop_nulls)
    }
}

enum RelType {
    Column(String),
    Fixed(String),
}

/// Construction-time builder for [`EdgeFrame`].
pub struct EdgeFrameBuilder {
    table: Table,
    rel_type: Option<RelType>,
    start: String,
    end: String,
    start_key: Option<String>,
    end_key: Option<String>,
    start_label_column: Option<String>,
    end_label_column: Option<String>,
    start_labels: Option<LabelSet>,
    end_labels: Option<LabelSet>,
    shared_labels: Option<LabelSet>,
}

impl EdgeFrameBuilder {
    /// Read relationship types from a column.
    pub fn rel_type_column(mut self, column: impl Into<String>) -> Self {
        self.rel_type = Some(RelType::Column(column.into()));
        self
    }

    /// Use one relationship type for every row.
    pub fn rel_type(mut self, rel_type: impl Into<String>) -> Self {
        self.rel_type = Some(RelType::Fixed(rel_type.into()));
        self
    }

    /// Start endpoint column (default `start`).
    pub fn start(mut self, column: impl Into<String>) -> Self {
        self.start = column.into();
        self
    }

    /// End endpoint column (default `end`).
    pub fn end(mut self, column: impl Into<String>) -> Self {
        self.end = column.into();
        self
    }

    /// Identity key for start nodes (default: the start column name).
    pub fn start_key(mut self, key: impl Into<String>) -> Self {
        self.start_key = Some(key.into());
        self
    }

    /// Identity key for end nodes (default: the end column name).
    pub fn end_key(mut self, key: impl Into<String>) -> Self {
        self.end_key = Some(key.into());
        self
    }

    pub fn start_label_column(mut self, column: impl Into<String>) -> Self {
        self.start_label_column = Some(column.into());
        self
    }

    pub fn end_label_column(mut self, column: impl Into<String>) -> Self {
        self.end_label_column = Some(column.into());
        self
    }

    pub fn start_labels(mut self, labels: impl Into<LabelSet>) -> Self {
        self.start_labels = Some(labels.into());
        self
    }

    pub fn end_labels(mut self, labels: impl Into<LabelSet>) -> Self {
        self.end_labels = Some(labels.into());
        self
    }

    /// Static labels applied to both endpoints. Mutually exclusive with
    /// per-endpoint static labels.
    pub fn labels(mut self, labels: impl Into<LabelSet>) -> Self {
        self.shared_labels = Some(labels.into());
        self
    }

    /// Validate columns, apply the relationship type and resolve endpoints
    /// when any label input was given.
    pub fn build(self) -> NeonResult<EdgeFrame> {
        let columns = [
            Some(&self.start),
            Some(&self.end),
            self.start_label_column.as_ref(),
            self.end_label_column.as_ref(),
        ];
        for column in columns.into_iter().flatten() {
            if !self.table.has_column(column) {
                return Err(NeonError::column_not_found(column.as_str()));
            }
        }

        let mut start = Endpoint::new(self.start, self.start_key);
        start.label_column = self.start_label_column;
        start.labels = self.start_labels;
        let mut end = Endpoint::new(self.end, self.end_key);
        end.label_column = self.end_label_column;
        end.labels = self.end_labels;

        let mut frame = EdgeFrame {
            table: self.table,
            start,
            end,
            shared_labels: self.shared_labels,
        };

        frame = match self.rel_type {
            Some(RelType::Column(column)) => frame.with_rel_type_column(&column)?,
            Some(RelType::Fixed(rel_type)) => frame.with_rel_type(&rel_type)?,
            None => frame,
        };

        if frame.has_label_input() {
            frame.resolve_endpoints()
        } else {
            Ok(frame)
        }
    }
}
