//! The seam between query construction and a live graph session.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::table::Record;
use crate::value::Value;

/// What a statement's result rows look like.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Returns {
    /// No rows are consumed.
    Nothing,
    /// Each row holds a node under the given alias. Executors flatten the
    /// node into a record: a `labels` cell followed by its properties.
    Nodes(String),
    /// Each row holds the named scalar fields.
    Fields(Vec<String>),
}

/// A query template plus its bound parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub text: String,
    pub params: BTreeMap<String, Value>,
    pub returns: Returns,
}

impl Statement {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            params: BTreeMap::new(),
            returns: Returns::Nothing,
        }
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn returning_nodes(mut self, alias: impl Into<String>) -> Self {
        self.returns = Returns::Nodes(alias.into());
        self
    }

    pub fn returning_fields<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        self.returns = Returns::Fields(fields.into_iter().map(Into::into).collect());
        self
    }
}

/// Runs statements against a graph store.
///
/// Implemented by the Neo4j client and by test doubles. The pure layers
/// (frames, encoding, query text) never call it; only reconciliation and
/// the upload paths do.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, statement: &Statement) -> anyhow::Result<Vec<Record>>;
}
