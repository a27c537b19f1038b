//! Set reconciliation between local tables and the graph store.
//!
//! A semi-join returns the remote nodes whose key matches a local row; an
//! anti-join returns the local rows with no remote match, i.e. what still
//! needs uploading.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cypher::{self, NODES_PARAM};
use crate::error::{NeonError, NeonResult};
use crate::executor::{QueryExecutor, Statement};
use crate::labels::LabelSet;
use crate::table::{Cell, Table};
use crate::value::Value;

/// What to do when the existence query fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Log the failure and report no matches, so every local row counts as
    /// absent.
    #[default]
    TreatAsAbsent,
    /// Return the failure to the caller.
    Propagate,
}

/// Build the batched existence statement for `local` keyed on `key`.
pub fn exists_statement(local: &Table, key: &str, labels: &LabelSet) -> NeonResult<Statement> {
    if !local.has_column(key) {
        return Err(NeonError::column_not_found(key));
    }
    let batch = Value::List(local.to_records(true).map(|record| record.to_value()).collect());
    Ok(Statement::new(cypher::exists_query(NODES_PARAM, labels, key, false))
        .param(NODES_PARAM, batch)
        .returning_nodes("n"))
}

/// Runs semi- and anti-joins through a [`QueryExecutor`].
pub struct Reconciler<'a, E: ?Sized> {
    executor: &'a E,
    policy: FailurePolicy,
}

impl<'a, E: QueryExecutor + ?Sized> Reconciler<'a, E> {
    pub fn new(executor: &'a E) -> Self {
        Self {
            executor,
            policy: FailurePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Remote nodes carrying `labels` whose `key` property equals the `key`
    /// value of some local row, one row per matched node.
    pub async fn semi_join(&self, local: &Table, key: &str, labels: &LabelSet) -> NeonResult<Table> {
        let statement = exists_statement(local, key, labels)?;

        match self.executor.execute(&statement).await {
            Ok(records) => {
                let matched = Table::from_records(records);
                debug!(key, local = local.len(), matched = matched.len(), "Semi-join complete");
                Ok(matched)
            }
            Err(e) => match self.policy {
                FailurePolicy::TreatAsAbsent => {
                    warn!(key, error = %format!("{:#}", e), "Existence check failed; treating all rows as absent");
                    Ok(Table::default())
                }
                FailurePolicy::Propagate => Err(NeonError::Execution(e)),
            },
        }
    }

    /// Local rows whose `key` value has no match among remote nodes
    /// carrying `labels`. Row order is preserved.
    pub async fn anti_join(&self, local: &Table, key: &str, labels: &LabelSet) -> NeonResult<Table> {
        let matched = self.semi_join(local, key, labels).await?;
        let remote_keys: HashSet<String> = match matched.column(key) {
            Ok(cells) => cells.map(join_key).collect(),
            Err(_) => return Ok(local.clone()),
        };

        let missing = local.filter(|row| {
            local
                .cell(row, key)
                .map_or(true, |cell| !remote_keys.contains(&join_key(cell)))
        });
        debug!(key, local = local.len(), missing = missing.len(), "Anti-join complete");
        Ok(missing)
    }
}

/// Raw key with whole floats folded into integers, so `1` and `1.0` join
/// the way the store compares them.
fn join_key(cell: &Cell) -> String {
    match cell {
        Cell::Value(Value::Float(f)) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
            Cell::Value(Value::Integer(*f as i64)).raw_key()
        }
        _ => cell.raw_key(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use anyhow::anyhow;
    use async_trait::async_trait;

    use super::*;
    use crate::executor::Returns;
    use crate::table::Record;

    /// Answers existence queries from an in-memory node list.
    struct MockStore {
        nodes: Vec<Record>,
        fail: bool,
        seen: Mutex<Vec<Statement>>,
    }

    impl MockStore {
        fn with_names(names: &[&str]) -> Self {
            Self {
                nodes: names
                    .iter()
                    .map(|n| Record::new().with("labels", LabelSet::from("Person")).with("name", *n))
                    .collect(),
                fail: false,
                seen: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::with_names(&[])
            }
        }
    }

    #[async_trait]
    impl QueryExecutor for MockStore {
        async fn execute(&self, statement: &Statement) -> anyhow::Result<Vec<Record>> {
            self.seen.lock().unwrap().push(statement.clone());
            if self.fail {
                return Err(anyhow!("connection refused"));
            }
            let Some(Value::List(batch)) = statement.params.get(NODES_PARAM) else {
                return Ok(Vec::new());
            };
            let wanted: Vec<&Value> = batch
                .iter()
                .filter_map(|item| match item {
                    Value::Map(map) => map.get("name"),
                    _ => None,
                })
                .collect();
            Ok(self
                .nodes
                .iter()
                .filter(|node| {
                    matches!(node.get("name"), Some(Cell::Value(v)) if wanted.contains(&v))
                })
                .cloned()
                .collect())
        }
    }

    fn local(names: &[&str]) -> Table {
        Table::from_records(names.iter().map(|n| Record::new().with("name", *n).with("age", Value::Null)))
    }

    #[tokio::test]
    async fn test_semi_join_returns_matches() {
        let store = MockStore::with_names(&["ada", "grace", "alan"]);
        let matched = Reconciler::new(&store)
            .semi_join(&local(&["ada", "linus"]), "name", &LabelSet::from("Person"))
            .await
            .unwrap();
        assert_eq!(matched.len(), 1);
        assert_eq!(matched.cell(0, "name"), Some(&Cell::from("ada")));

        let seen = store.seen.lock().unwrap();
        assert_eq!(seen[0].returns, Returns::Nodes("n".to_string()));
        assert!(seen[0].text.contains("MATCH (n:Person {name: node.name})"));
    }

    #[tokio::test]
    async fn test_payload_drops_null_fields() {
        let store = MockStore::with_names(&[]);
        Reconciler::new(&store)
            .semi_join(&local(&["ada"]), "name", &LabelSet::from("Person"))
            .await
            .unwrap();
        let seen = store.seen.lock().unwrap();
        let Some(Value::List(batch)) = seen[0].params.get(NODES_PARAM) else {
            panic!("missing batch parameter");
        };
        let Value::Map(row) = &batch[0] else {
            panic!("expected a map");
        };
        assert!(!row.contains_key("age"));
    }

    #[tokio::test]
    async fn test_anti_join_all_present_is_empty() {
        let store = MockStore::with_names(&["ada", "grace"]);
        let missing = Reconciler::new(&store)
            .anti_join(&local(&["ada", "grace"]), "name", &LabelSet::from("Person"))
            .await
            .unwrap();
        assert!(missing.is_empty());
    }

    #[tokio::test]
    async fn test_anti_join_none_present_is_identity() {
        let store = MockStore::with_names(&["alan"]);
        let rows = local(&["ada", "grace"]);
        let missing = Reconciler::new(&store)
            .anti_join(&rows, "name", &LabelSet::from("Person"))
            .await
            .unwrap();
        assert_eq!(missing, rows);
    }

    #[tokio::test]
    async fn test_anti_join_keeps_order_of_missing_rows() {
        let store = MockStore::with_names(&["grace"]);
        let missing = Reconciler::new(&store)
            .anti_join(&local(&["ada", "grace", "linus"]), "name", &LabelSet::from("Person"))
            .await
            .unwrap();
        let names: Vec<&Cell> = missing.column("name").unwrap().collect();
        assert_eq!(names, vec![&Cell::from("ada"), &Cell::from("linus")]);
    }

    struct FixedStore(Vec<Record>);

    #[async_trait]
    impl QueryExecutor for FixedStore {
        async fn execute(&self, _statement: &Statement) -> anyhow::Result<Vec<Record>> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn test_anti_join_matches_whole_floats_to_integers() {
        let store = FixedStore(vec![
            Record::new().with("labels", LabelSet::from("Item")).with("id", 1.0),
            Record::new().with("labels", LabelSet::from("Item")).with("id", 2.5),
        ]);
        let rows = Table::from_records([1i64, 2, 3].map(|id| Record::new().with("id", id)));
        let missing = Reconciler::new(&store)
            .anti_join(&rows, "id", &LabelSet::from("Item"))
            .await
            .unwrap();
        let ids: Vec<&Cell> = missing.column("id").unwrap().collect();
        assert_eq!(ids, vec![&Cell::from(2i64), &Cell::from(3i64)]);
    }

    #[tokio::test]
    async fn test_failure_treated_as_absent() {
        let store = MockStore::failing();
        let rows = local(&["ada", "grace"]);
        let reconciler = Reconciler::new(&store);

        let matched = reconciler.semi_join(&rows, "name", &LabelSet::from("Person")).await.unwrap();
        assert!(matched.is_empty());

        let missing = reconciler.anti_join(&rows, "name", &LabelSet::from("Person")).await.unwrap();
        assert_eq!(missing, rows);
    }

    #[tokio::test]
    async fn test_failure_propagates_when_asked() {
        let store = MockStore::failing();
        let err = Reconciler::new(&store)
            .with_policy(FailurePolicy::Propagate)
            .semi_join(&local(&["ada"]), "name", &LabelSet::from("Person"))
            .await
            .unwrap_err();
        assert!(matches!(err, NeonError::Execution(_)));
        assert!(err.to_string().contains("connection refused"));
    }

    #[tokio::test]
    async fn test_missing_key_column_is_an_error() {
        let store = MockStore::with_names(&["ada"]);
        let err = Reconciler::new(&store)
            .anti_join(&local(&["ada"]), "email", &LabelSet::from("Person"))
            .await
            .unwrap_err();
        assert!(matches!(err, NeonError::ColumnNotFound(_)));
        assert!(store.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_failure_policy_from_config_string() {
        #[derive(Deserialize)]
        struct Wrapper {
            on_failure: FailurePolicy,
        }
        let parsed: Wrapper = serde_json::from_str(r#"{"on_failure": "propagate"}"#).unwrap();
        assert_eq!(parsed.on_failure, FailurePolicy::Propagate);
        assert_eq!(FailurePolicy::default(), FailurePolicy::TreatAsAbsent);
    }
}
