//! Read-side queries: ad hoc node matching and store counts.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use serde::Serialize;

use neon_core::{cypher, Cell, LabelSet, QueryExecutor, Statement, Table, Value};

/// Nodes carrying `labels` whose properties equal `properties`, as a table
/// with a leading `labels` column.
pub async fn match_nodes<E>(
    executor: &E,
    labels: &LabelSet,
    properties: &BTreeMap<String, Value>,
    limit: Option<usize>,
) -> Result<Table>
where
    E: QueryExecutor + ?Sized,
{
    let statement = Statement::new(cypher::node_match_query(labels, properties, limit)).returning_nodes("n");
    let records = executor.execute(&statement).await.context("Node match failed")?;
    Ok(Table::from_records(records))
}

/// Node and relationship counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphCounts {
    pub nodes: usize,
    pub relationships: usize,
}

async fn count<E>(executor: &E, text: &str) -> Result<usize>
where
    E: QueryExecutor + ?Sized,
{
    let statement = Statement::new(text).returning_fields(["count"]);
    let records = executor.execute(&statement).await?;
    let count = records
        .first()
        .and_then(|record| record.get("count"))
        .and_then(Cell::as_value)
        .and_then(Value::as_integer)
        .unwrap_or(0);
    Ok(usize::try_from(count).unwrap_or(0))
}

/// Get node and relationship counts for status display.
pub async fn get_counts<E>(executor: &E) -> Result<GraphCounts>
where
    E: QueryExecutor + ?Sized,
{
    Ok(GraphCounts {
        nodes: count(executor, "MATCH (n) RETURN count(n) AS count")
            .await
            .context("Failed to count nodes")?,
        relationships: count(executor, "MATCH ()-[r]->() RETURN count(r) AS count")
            .await
            .context("Failed to count relationships")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockExecutor;
    use neon_core::{Record, Returns};

    #[tokio::test]
    async fn test_match_nodes_builds_table() {
        let executor = MockExecutor::new().respond(vec![
            Record::new().with("labels", LabelSet::from("Person")).with("name", "Ada"),
            Record::new()
                .with("labels", LabelSet::from("Person"))
                .with("name", "Grace")
                .with("rank", "Rear Admiral"),
        ]);
        let props = BTreeMap::from([("active".to_string(), Value::Bool(true))]);
        let table = match_nodes(&executor, &LabelSet::from("Person"), &props, Some(10))
            .await
            .unwrap();

        assert_eq!(table.columns(), ["labels", "name", "rank"]);
        assert_eq!(table.len(), 2);
        assert!(table.cell(0, "rank").unwrap().is_null());

        let seen = executor.statements();
        assert_eq!(seen[0].text, "MATCH (n:Person {active: true}) RETURN n LIMIT 10");
        assert_eq!(seen[0].returns, Returns::Nodes("n".to_string()));
    }

    #[tokio::test]
    async fn test_get_counts() {
        let executor = MockExecutor::new()
            .respond(vec![Record::new().with("count", 12i64)])
            .respond(vec![Record::new().with("count", 30i64)]);
        let counts = get_counts(&executor).await.unwrap();
        assert_eq!(counts, GraphCounts { nodes: 12, relationships: 30 });
    }

    #[tokio::test]
    async fn test_get_counts_empty_result() {
        let counts = get_counts(&MockExecutor::new()).await.unwrap();
        assert_eq!(counts, GraphCounts::default());
    }
}
