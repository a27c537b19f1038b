//! `neon match` and `neon status`: read-only views of the graph.

use anyhow::Result;
use clap::Args;

use neon_core::{cypher, LabelSet, Statement};

use super::{label_set, RunContext};
use crate::{input, output};

#[derive(Args)]
pub struct MatchArgs {
    /// Node label (repeatable)
    #[arg(short, long = "label")]
    pub labels: Vec<String>,

    /// Property filter as key=value (repeatable)
    #[arg(short, long = "prop", value_name = "KEY=VALUE")]
    pub properties: Vec<String>,

    /// Maximum number of nodes
    #[arg(long)]
    pub limit: Option<usize>,

    /// Print nodes as JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

pub async fn execute_match(args: MatchArgs, ctx: &RunContext) -> Result<()> {
    let labels = label_set(&args.labels).unwrap_or_else(LabelSet::new);
    let properties = input::parse_properties(&args.properties)?;

    if ctx.dry_run {
        let statement = Statement::new(cypher::node_match_query(&labels, &properties, args.limit));
        return output::print_statement(1, &statement);
    }

    let client = ctx.connect().await?;
    let table = neon_graph::match_nodes(&client, &labels, &properties, args.limit).await?;
    if args.json {
        output::print_json(&table)
    } else {
        output::print_table(&table);
        Ok(())
    }
}

/// Counts are read-only, so `--dry-run` has no effect here.
pub async fn execute_status(ctx: &RunContext) -> Result<()> {
    let client = ctx.connect().await?;
    let counts = neon_graph::get_counts(&client).await?;
    output::print_counts(&counts);
    Ok(())
}
