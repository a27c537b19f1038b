//! CLI command definitions and handlers.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use neon_core::{LabelSet, Table};
use neon_graph::{GraphClient, GraphConfig};

use crate::config::NeonConfig;
use crate::input;

pub mod constraints;
pub mod diff;
pub mod edges;
pub mod nodes;
pub mod query;

/// How long to wait for the first bolt round trip.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Load tabular data into Neo4j as labeled nodes and relationships
#[derive(Parser)]
#[command(name = "neon")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a TOML config file (defaults to ./neon.toml when present)
    #[arg(short, long, global = true, env = "NEON_CONFIG")]
    pub config: Option<PathBuf>,

    /// Also write logs to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Print statements and payloads instead of executing them
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create nodes from a table
    Nodes(nodes::NodesArgs),

    /// Create relationships from a table
    Edges(edges::EdgesArgs),

    /// Create uniqueness constraints from a table of labels and properties
    Constraints(constraints::ConstraintsArgs),

    /// Match nodes by labels and properties
    Match(query::MatchArgs),

    /// Show local rows that do not yet exist in the graph
    Diff(diff::DiffArgs),

    /// Show node and relationship counts
    Status,
}

/// Settings shared by every command.
pub struct RunContext {
    pub config: NeonConfig,
    pub dry_run: bool,
}

impl RunContext {
    pub async fn connect(&self) -> Result<GraphClient> {
        connect(&self.config.graph).await
    }

    /// Batch size from the command line, falling back to the config.
    pub fn batch_size(&self, flag: Option<usize>) -> usize {
        flag.unwrap_or(self.config.graph.batch_size)
    }
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let ctx = RunContext {
            config: NeonConfig::load(self.config.as_deref())?,
            dry_run: self.dry_run,
        };

        match self.command {
            Commands::Nodes(args) => nodes::execute(args, &ctx).await,
            Commands::Edges(args) => edges::execute(args, &ctx).await,
            Commands::Constraints(args) => constraints::execute(args, &ctx).await,
            Commands::Match(args) => query::execute_match(args, &ctx).await,
            Commands::Diff(args) => diff::execute(args, &ctx).await,
            Commands::Status => query::execute_status(&ctx).await,
        }
    }
}

/// Connect to Neo4j, failing fast when the server does not answer.
pub async fn connect(config: &GraphConfig) -> Result<GraphClient> {
    tokio::time::timeout(CONNECT_TIMEOUT, GraphClient::connect(config))
        .await
        .with_context(|| format!("Timed out connecting to Neo4j at {}", config.uri))?
}

/// Read the input table and convert the requested datetime columns.
pub fn load_table(path: &std::path::Path, datetime_columns: &[String]) -> Result<Table> {
    let mut table = input::read_table(path)?;
    for column in datetime_columns {
        table
            .parse_datetimes(column)
            .with_context(|| format!("Failed to parse datetimes in column '{}'", column))?;
    }
    Ok(table)
}

/// Collect repeated `--label` flags into a label set.
pub fn label_set(labels: &[String]) -> Option<LabelSet> {
    if labels.is_empty() {
        None
    } else {
        Some(labels.iter().map(String::as_str).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_nodes_command() {
        let cli = Cli::parse_from([
            "neon",
            "--dry-run",
            "nodes",
            "people.json",
            "--label",
            "Person",
            "--label",
            "Imported",
            "--id-column",
            "email",
        ]);
        assert!(cli.dry_run);
        let Commands::Nodes(args) = cli.command else {
            panic!("expected nodes command");
        };
        assert_eq!(args.labels, vec!["Person", "Imported"]);
        assert_eq!(args.id_column.as_deref(), Some("email"));
    }

    #[test]
    fn test_rel_type_flags_conflict() {
        let result = Cli::try_parse_from([
            "neon",
            "edges",
            "links.json",
            "--rel-type",
            "LINKS",
            "--rel-type-column",
            "kind",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_label_set() {
        assert!(label_set(&[]).is_none());
        let labels = label_set(&["A".to_string(), "B".to_string(), "A".to_string()]).unwrap();
        assert_eq!(labels.len(), 2);
    }
}
