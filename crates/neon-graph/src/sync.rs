//! Bulk upload of node and edge frames.
//!
//! Frames are encoded once, split into batches of `batch_size` payloads and
//! sent as one templated statement per batch.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info};

use neon_core::encode::{edges_statement, nodes_statement};
use neon_core::{encode_edges, encode_nodes, EdgeFrame, NodeFrame, QueryExecutor, Record, Statement, Value};

/// Result of an upload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncResult {
    pub nodes_created: usize,
    pub relationships_created: usize,
    pub batches: usize,
}

impl SyncResult {
    pub fn merge(&mut self, other: &SyncResult) {
        self.nodes_created += other.nodes_created;
        self.relationships_created += other.relationships_created;
        self.batches += other.batches;
    }
}

/// The batched creation statements for a labelled node frame.
pub fn node_statements(frame: &NodeFrame, batch_size: usize) -> Result<Vec<Statement>> {
    let payloads = encode_nodes(frame)?;
    Ok(payloads.chunks(batch_size.max(1)).map(nodes_statement).collect())
}

/// The batched merge statements for a typed, resolved edge frame.
pub fn edge_statements(frame: &EdgeFrame, batch_size: usize) -> Result<Vec<Statement>> {
    let payloads = encode_edges(frame)?;
    Ok(payloads.chunks(batch_size.max(1)).map(edges_statement).collect())
}

/// Sum of the `created` counters returned by a bulk statement.
fn created_count(records: &[Record]) -> usize {
    records
        .iter()
        .filter_map(|record| match record.get("created")?.as_value()? {
            Value::Integer(n) => usize::try_from(*n).ok(),
            _ => None,
        })
        .sum()
}

/// Create every node in `frame`.
pub async fn create_nodes<E>(executor: &E, frame: &NodeFrame, batch_size: usize) -> Result<SyncResult>
where
    E: QueryExecutor + ?Sized,
{
    let statements = node_statements(frame, batch_size)?;
    info!(rows = frame.len(), batches = statements.len(), "Creating nodes");

    let mut result = SyncResult::default();
    for (i, statement) in statements.iter().enumerate() {
        let records = executor
            .execute(statement)
            .await
            .with_context(|| format!("Failed to create node batch {}", i + 1))?;
        let created = created_count(&records);
        debug!(batch = i + 1, created, "Node batch uploaded");
        result.nodes_created += created;
        result.batches += 1;
    }

    info!(nodes_created = result.nodes_created, batches = result.batches, "Nodes created");
    Ok(result)
}

/// Merge every relationship in `frame`, creating missing endpoint nodes.
pub async fn create_edges<E>(executor: &E, frame: &EdgeFrame, batch_size: usize) -> Result<SyncResult>
where
    E: QueryExecutor + ?Sized,
{
    let statements = edge_statements(frame, batch_size)?;
    info!(rows = frame.len(), batches = statements.len(), "Creating relationships");

    let mut result = SyncResult::default();
    for (i, statement) in statements.iter().enumerate() {
        let records = executor
            .execute(statement)
            .await
            .with_context(|| format!("Failed to create relationship batch {}", i + 1))?;
        let created = created_count(&records);
        debug!(batch = i + 1, created, "Relationship batch uploaded");
        result.relationships_created += created;
        result.batches += 1;
    }

    info!(
        relationships_created = result.relationships_created,
        batches = result.batches,
        "Relationships created"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockExecutor;
    use neon_core::cypher::{EDGES_PARAM, NODES_PARAM};
    use neon_core::{LabelSpec, NeonError, Table};

    fn people(n: i64) -> Table {
        Table::from_records((0..n).map(|i| Record::new().with("id", i).with("name", format!("person-{}", i))))
    }

    fn batch_len(statement: &Statement, param: &str) -> usize {
        match statement.params.get(param) {
            Some(Value::List(items)) => items.len(),
            _ => 0,
        }
    }

    #[tokio::test]
    async fn test_create_nodes_in_batches() {
        let frame = NodeFrame::new(people(5)).with_labels(LabelSpec::fixed("Person")).unwrap();
        let executor = MockExecutor::new()
            .respond(vec![Record::new().with("created", 2i64)])
            .respond(vec![Record::new().with("created", 2i64)])
            .respond(vec![Record::new().with("created", 1i64)]);

        let result = create_nodes(&executor, &frame, 2).await.unwrap();
        assert_eq!(result.nodes_created, 5);
        assert_eq!(result.batches, 3);

        let seen = executor.statements();
        assert_eq!(seen.len(), 3);
        assert_eq!(batch_len(&seen[0], NODES_PARAM), 2);
        assert_eq!(batch_len(&seen[2], NODES_PARAM), 1);
    }

    #[tokio::test]
    async fn test_create_nodes_requires_labels() {
        let frame = NodeFrame::new(people(1));
        let executor = MockExecutor::new();
        let err = create_nodes(&executor, &frame, 10).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<NeonError>(), Some(NeonError::UploadNotReady(_))));
        assert!(executor.statements().is_empty());
    }

    #[tokio::test]
    async fn test_empty_frame_sends_nothing() {
        let frame = NodeFrame::new(people(0)).with_labels(LabelSpec::fixed("Person")).unwrap();
        let executor = MockExecutor::new();
        let result = create_nodes(&executor, &frame, 10).await.unwrap();
        assert_eq!(result, SyncResult::default());
        assert!(executor.statements().is_empty());
    }

    #[tokio::test]
    async fn test_create_edges() {
        let table = Table::from_records(vec![
            Record::new().with("start", 1i64).with("end", 2i64),
            Record::new().with("start", 2i64).with("end", 3i64),
        ]);
        let frame = EdgeFrame::builder(table)
            .rel_type("LINKS")
            .start_key("id")
            .end_key("id")
            .labels("Page")
            .build()
            .unwrap();
        let executor = MockExecutor::new().respond(vec![Record::new().with("created", 2i64)]);

        let result = create_edges(&executor, &frame, 100).await.unwrap();
        assert_eq!(result.relationships_created, 2);

        let seen = executor.statements();
        assert!(seen[0].text.contains("apoc.merge.relationship"));
        assert_eq!(batch_len(&seen[0], EDGES_PARAM), 2);
    }

    #[tokio::test]
    async fn test_create_edges_rejects_unresolved() {
        let table = Table::from_records(vec![Record::new().with("start", 1i64).with("end", 2i64)]);
        let frame = EdgeFrame::builder(table).rel_type("LINKS").build().unwrap();
        let err = create_edges(&MockExecutor::new(), &frame, 100).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<NeonError>(),
            Some(NeonError::UnresolvedEndpoint { .. })
        ));
    }

    #[tokio::test]
    async fn test_execution_failure_names_batch() {
        let frame = NodeFrame::new(people(1)).with_labels(LabelSpec::fixed("Person")).unwrap();
        let executor = MockExecutor::new().fail("apoc not installed");
        let err = create_nodes(&executor, &frame, 10).await.unwrap_err();
        let message = format!("{:#}", err);
        assert!(message.contains("node batch 1"));
        assert!(message.contains("apoc not installed"));
    }

    #[test]
    fn test_sync_result_merge() {
        let mut total = SyncResult {
            nodes_created: 2,
            relationships_created: 0,
            batches: 1,
        };
        total.merge(&SyncResult {
            nodes_created: 0,
            relationships_created: 3,
            batches: 2,
        });
        assert_eq!(total.nodes_created, 2);
        assert_eq!(total.relationships_created, 3);
        assert_eq!(total.batches, 3);
    }
}
