//! Row-oriented tables.
//!
//! A [`Table`] is the plain container both frame kinds wrap. Columns are
//! named, unique and ordered; each row holds one [`Cell`] per column.

use serde::Serialize;

use crate::error::{NeonError, NeonResult};
use crate::labels::LabelSet;
use crate::node::NodeRef;
use crate::value::Value;

/// A single table slot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Value(Value),
    Labels(LabelSet),
    Node(NodeRef),
}

impl Cell {
    pub fn null() -> Self {
        Cell::Value(Value::Null)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Value(Value::Null))
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Cell::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_labels(&self) -> Option<&LabelSet> {
        match self {
            Cell::Labels(labels) => Some(labels),
            _ => None,
        }
    }

    pub fn as_node(&self) -> Option<&NodeRef> {
        match self {
            Cell::Node(node) => Some(node),
            _ => None,
        }
    }

    /// Flatten into a plain value for the wire: labels become a list of
    /// strings, a node becomes its identity value. Graph properties cannot
    /// hold maps, so the identity key is left to the enclosing column.
    pub fn to_value(&self) -> Value {
        match self {
            Cell::Value(v) => v.clone(),
            Cell::Labels(labels) => Value::List(labels.iter().map(Value::from).collect()),
            Cell::Node(node) => node.identity().1.clone(),
        }
    }

    /// Key for raw-equality comparisons (dedup, joins). Debug output is
    /// structural, so two cells share a key exactly when they hold the same
    /// variant and contents.
    pub(crate) fn raw_key(&self) -> String {
        format!("{:?}", self)
    }
}

impl From<Value> for Cell {
    fn from(value: Value) -> Self {
        Cell::Value(value)
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Value(Value::from(s))
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Value(Value::String(s))
    }
}

impl From<i64> for Cell {
    fn from(i: i64) -> Self {
        Cell::Value(Value::Integer(i))
    }
}

impl From<f64> for Cell {
    fn from(f: f64) -> Self {
        Cell::Value(Value::Float(f))
    }
}

impl From<bool> for Cell {
    fn from(b: bool) -> Self {
        Cell::Value(Value::Bool(b))
    }
}

impl From<LabelSet> for Cell {
    fn from(labels: LabelSet) -> Self {
        Cell::Labels(labels)
    }
}

impl From<NodeRef> for Cell {
    fn from(node: NodeRef) -> Self {
        Cell::Node(node)
    }
}

/// One row as ordered `(column, cell)` pairs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, Cell)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, replacing an existing one with the same name in place.
    pub fn insert(&mut self, name: impl Into<String>, cell: impl Into<Cell>) {
        let name = name.into();
        let cell = cell.into();
        match self.fields.iter_mut().find(|(k, _)| *k == name) {
            Some((_, slot)) => *slot = cell,
            None => self.fields.push((name, cell)),
        }
    }

    pub fn with(mut self, name: impl Into<String>, cell: impl Into<Cell>) -> Self {
        self.insert(name, cell);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Cell> {
        self.fields.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Cell)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Flatten every field into a wire value map.
    pub fn to_value(&self) -> Value {
        Value::Map(self.iter().map(|(k, v)| (k.to_string(), v.to_value())).collect())
    }
}

impl IntoIterator for Record {
    type Item = (String, Cell);
    type IntoIter = std::vec::IntoIter<(String, Cell)>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl<K: Into<String>, C: Into<Cell>> FromIterator<(K, C)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, C)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (k, c) in iter {
            record.insert(k, c);
        }
        record
    }
}

/// Lazy iterator over a table's rows as records. Call
/// [`Table::to_records`] again to restart.
pub struct Records<'a> {
    table: &'a Table,
    row: usize,
    drop_nulls: bool,
}

impl Iterator for Records<'_> {
    type Item = Record;

    fn next(&mut self) -> Option<Record> {
        let cells = self.table.rows.get(self.row)?;
        self.row += 1;
        Some(
            self.table
                .columns
                .iter()
                .zip(cells)
                .filter(|(_, cell)| !(self.drop_nulls && cell.is_null()))
                .map(|(name, cell)| (name.clone(), cell.clone()))
                .collect(),
        )
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.table.rows.len() - self.row;
        (remaining, Some(remaining))
    }
}

/// An ordered sequence of rows over uniquely named columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Create an empty table with the given columns.
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> NeonResult<Self> {
        let mut table = Table::default();
        for name in columns {
            let name = name.into();
            if table.has_column(&name) {
                return Err(NeonError::DuplicateColumn(name));
            }
            table.columns.push(name);
        }
        Ok(table)
    }

    /// Build a table from records. Columns appear in first-seen order;
    /// fields missing from a record are filled with null.
    pub fn from_records(records: impl IntoIterator<Item = Record>) -> Self {
        let mut table = Table::default();
        for record in records {
            let mut row = vec![Cell::null(); table.columns.len()];
            for (name, cell) in record {
                match table.position(&name) {
                    Some(idx) => row[idx] = cell,
                    None => {
                        table.columns.push(name);
                        for existing in &mut table.rows {
                            existing.push(Cell::null());
                        }
                        row.push(cell);
                    }
                }
            }
            table.rows.push(row);
        }
        table
    }

    /// Build a table from a JSON array of objects.
    pub fn from_json(json: serde_json::Value) -> NeonResult<Self> {
        let items = match json {
            serde_json::Value::Array(items) => items,
            other => return Err(NeonError::conformance("an array of records", other.to_string())),
        };
        let records = items
            .into_iter()
            .map(|item| match item {
                serde_json::Value::Object(map) => Ok(map
                    .into_iter()
                    .map(|(k, v)| (k, Cell::Value(Value::from(v))))
                    .collect::<Record>()),
                other => Err(NeonError::conformance("a record", other.to_string())),
            })
            .collect::<NeonResult<Vec<_>>>()?;
        Ok(Self::from_records(records))
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    fn require(&self, name: &str) -> NeonResult<usize> {
        self.position(name).ok_or_else(|| NeonError::column_not_found(name))
    }

    /// Iterate the cells of one column.
    pub fn column(&self, name: &str) -> NeonResult<impl Iterator<Item = &Cell> + '_> {
        let idx = self.require(name)?;
        Ok(self.rows.iter().map(move |row| &row[idx]))
    }

    pub fn cell(&self, row: usize, name: &str) -> Option<&Cell> {
        let idx = self.position(name)?;
        self.rows.get(row).map(|r| &r[idx])
    }

    /// Rows as `(column, cell)` pairs, without copying.
    pub fn rows(&self) -> impl Iterator<Item = impl Iterator<Item = (&str, &Cell)>> + '_ {
        self.rows
            .iter()
            .map(|row| self.columns.iter().map(String::as_str).zip(row.iter()))
    }

    /// Append a row. Fields naming unknown columns are rejected; missing
    /// fields are null.
    pub fn push_row(&mut self, record: Record) -> NeonResult<()> {
        let mut row = vec![Cell::null(); self.columns.len()];
        for (name, cell) in record {
            let idx = self.require(&name)?;
            row[idx] = cell;
        }
        self.rows.push(row);
        Ok(())
    }

    /// Insert a column at `index`, shifting later columns right.
    pub fn insert_column(&mut self, index: usize, name: impl Into<String>, values: Vec<Cell>) -> NeonResult<()> {
        let name = name.into();
        if self.has_column(&name) {
            return Err(NeonError::DuplicateColumn(name));
        }
        if index > self.columns.len() {
            return Err(NeonError::IndexOutOfBounds {
                index,
                width: self.columns.len(),
            });
        }
        // A table without columns has no rows yet, so the first column sets the length.
        if self.columns.is_empty() && self.rows.is_empty() {
            self.rows = vec![Vec::new(); values.len()];
        }
        if values.len() != self.rows.len() {
            return Err(NeonError::LengthMismatch {
                column: name,
                expected: self.rows.len(),
                found: values.len(),
            });
        }
        self.columns.insert(index, name);
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.insert(index, value);
        }
        Ok(())
    }

    /// Remove a column, returning its cells.
    pub fn drop_column(&mut self, name: &str) -> NeonResult<Vec<Cell>> {
        let idx = self.require(name)?;
        self.columns.remove(idx);
        Ok(self.rows.iter_mut().map(|row| row.remove(idx)).collect())
    }

    pub fn rename_column(&mut self, old: &str, new: impl Into<String>) -> NeonResult<()> {
        let idx = self.require(old)?;
        let new = new.into();
        if new != old && self.has_column(&new) {
            return Err(NeonError::DuplicateColumn(new));
        }
        self.columns[idx] = new;
        Ok(())
    }

    /// Replace every cell of an existing column.
    pub fn replace_column(&mut self, name: &str, values: Vec<Cell>) -> NeonResult<()> {
        let idx = self.require(name)?;
        if values.len() != self.rows.len() {
            return Err(NeonError::LengthMismatch {
                column: name.to_string(),
                expected: self.rows.len(),
                found: values.len(),
            });
        }
        for (row, value) in self.rows.iter_mut().zip(values) {
            row[idx] = value;
        }
        Ok(())
    }

    /// Convert RFC 3339 strings in a column into datetimes. Nulls and
    /// values that are already datetimes are left alone.
    pub fn parse_datetimes(&mut self, name: &str) -> NeonResult<()> {
        let idx = self.require(name)?;
        for row in &mut self.rows {
            let parsed = match &row[idx] {
                Cell::Value(Value::String(s)) => {
                    Value::parse_datetime(s).ok_or_else(|| NeonError::conformance("an RFC 3339 datetime", s))?
                }
                Cell::Value(Value::Null | Value::DateTime(_)) => continue,
                other => return Err(NeonError::conformance("an RFC 3339 datetime", other)),
            };
            row[idx] = Cell::Value(parsed);
        }
        Ok(())
    }

    /// A new table holding only the named columns, in the given order.
    pub fn select(&self, names: &[&str]) -> NeonResult<Table> {
        let idxs = names.iter().map(|n| self.require(n)).collect::<NeonResult<Vec<_>>>()?;
        let mut table = Table::new(names.iter().copied())?;
        table.rows = self
            .rows
            .iter()
            .map(|row| idxs.iter().map(|&i| row[i].clone()).collect())
            .collect();
        Ok(table)
    }

    /// A new table holding the rows for which `keep` returns true. The
    /// predicate receives the row index.
    pub fn filter(&self, mut keep: impl FnMut(usize) -> bool) -> Table {
        Table {
            columns: self.columns.clone(),
            rows: self
                .rows
                .iter()
                .enumerate()
                .filter(|(i, _)| keep(*i))
                .map(|(_, row)| row.clone())
                .collect(),
        }
    }

    /// Split into consecutive tables of at most `size` rows.
    pub fn chunks(&self, size: usize) -> impl Iterator<Item = Table> + '_ {
        self.rows.chunks(size.max(1)).map(|rows| Table {
            columns: self.columns.clone(),
            rows: rows.to_vec(),
        })
    }

    /// Iterate rows as records; with `drop_nulls`, null cells are omitted.
    pub fn to_records(&self, drop_nulls: bool) -> Records<'_> {
        Records {
            table: self,
            row: 0,
            drop_nulls,
        }
    }
}
