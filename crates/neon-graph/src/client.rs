//! Neo4j connection client.

use anyhow::{Context, Result};
use async_trait::async_trait;
use neo4rs::{ConfigBuilder, Graph, Query};
use serde::Deserialize;
use tracing::debug;

use neon_core::{QueryExecutor, Record, Returns, Statement};

use crate::bolt;

/// Configuration for connecting to Neo4j.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
    pub db: String,
    pub max_connections: usize,
    pub fetch_size: usize,
    /// Rows per bulk upload statement.
    pub batch_size: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            uri: "bolt://localhost:7687".to_string(),
            user: "neo4j".to_string(),
            password: "neo4j".to_string(),
            db: "neo4j".to_string(),
            max_connections: 4,
            fetch_size: 200,
            batch_size: 1000,
        }
    }
}

/// Client for a Neo4j database with the APOC plugin installed.
#[derive(Clone)]
pub struct GraphClient {
    graph: Graph,
}

impl GraphClient {
    /// Connect and ping.
    ///
    /// `Graph::connect` only builds a lazy pool, so a `RETURN 1` round trip
    /// is made here to surface an unreachable server immediately.
    pub async fn connect(config: &GraphConfig) -> Result<Self> {
        let neo4j_config = ConfigBuilder::default()
            .uri(&config.uri)
            .user(&config.user)
            .password(&config.password)
            .db(config.db.as_str())
            .max_connections(config.max_connections)
            .fetch_size(config.fetch_size)
            .build()
            .context("Failed to build Neo4j config")?;

        let graph = Graph::connect(neo4j_config)
            .await
            .context("Failed to create Neo4j connection pool")?;

        graph
            .run(Query::new("RETURN 1".to_string()))
            .await
            .context("Neo4j is not responding to queries")?;

        debug!(uri = %config.uri, db = %config.db, "Connected to Neo4j");
        Ok(Self { graph })
    }

    /// Run a Cypher query that returns no results.
    pub async fn run(&self, query: Query) -> Result<()> {
        self.graph.run(query).await.context("Neo4j query execution failed")?;
        Ok(())
    }

    /// Run a Cypher query and collect its rows.
    pub async fn query(&self, query: Query) -> Result<Vec<neo4rs::Row>> {
        let mut result = self.graph.execute(query).await.context("Neo4j query failed")?;

        let mut rows = Vec::new();
        while let Some(row) = result.next().await.context("Failed to read Neo4j result row")? {
            rows.push(row);
        }
        Ok(rows)
    }

    /// Get a reference to the underlying neo4rs Graph.
    pub fn inner(&self) -> &Graph {
        &self.graph
    }
}

#[async_trait]
impl QueryExecutor for GraphClient {
    async fn execute(&self, statement: &Statement) -> Result<Vec<Record>> {
        let query = bolt::to_query(statement);
        match &statement.returns {
            Returns::Nothing => {
                self.run(query).await?;
                Ok(Vec::new())
            }
            returns => self
                .query(query)
                .await?
                .iter()
                .map(|row| bolt::row_to_record(row, returns))
                .collect(),
        }
    }
}
