//! Uniqueness constraints driven by a table of (labels, property) pairs.

use anyhow::{Context, Result};
use tracing::info;

use neon_core::{cypher, LabelSet, NeonError, QueryExecutor, Statement, Table, Value};

/// One constraint statement per row of `table`. `labels_col` holds a label
/// or list of labels, `property_col` the property name to make unique.
pub fn constraint_statements(table: &Table, labels_col: &str, property_col: &str) -> Result<Vec<(LabelSet, Statement)>> {
    let labels = table.column(labels_col)?;
    let properties = table.column(property_col)?;

    labels
        .zip(properties)
        .map(|(labels, property)| -> Result<(LabelSet, Statement)> {
            let labels = LabelSet::conform_cell(labels)?;
            let property = match property.as_value() {
                Some(Value::String(name)) => name,
                _ => return Err(NeonError::conformance("a property name", property).into()),
            };
            let statement = Statement::new(cypher::unique_constraint_query(&labels, property));
            Ok((labels, statement))
        })
        .collect()
}

/// Create the uniqueness constraints described by `table`.
///
/// Safe to run repeatedly: statements use IF NOT EXISTS. The first failure
/// aborts, naming the labels it was applied to.
pub async fn create_node_constraints<E>(executor: &E, table: &Table, labels_col: &str, property_col: &str) -> Result<usize>
where
    E: QueryExecutor + ?Sized,
{
    let statements = constraint_statements(table, labels_col, property_col)?;

    for (labels, statement) in &statements {
        executor
            .execute(statement)
            .await
            .with_context(|| format!("Failed to create uniqueness constraint for labels {:?}", labels.to_vec()))?;
    }

    info!(count = statements.len(), "Uniqueness constraints ensured");
    Ok(statements.len())
}
