//! `neon edges`: merge relationships from a table.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use neon_core::EdgeFrame;
use neon_graph::sync::edge_statements;

use super::{label_set, load_table, RunContext};
use crate::output;

#[derive(Args)]
pub struct EdgesArgs {
    /// CSV, JSON array or JSON-lines file (`-` reads JSON from stdin)
    pub input: PathBuf,

    /// Relationship type for every row
    #[arg(long, conflicts_with = "rel_type_column")]
    pub rel_type: Option<String>,

    /// Column holding each row's relationship type
    #[arg(long)]
    pub rel_type_column: Option<String>,

    /// Start endpoint column
    #[arg(long, default_value = "start")]
    pub start: String,

    /// End endpoint column
    #[arg(long, default_value = "end")]
    pub end: String,

    /// Property identifying start nodes (defaults to the start column name)
    #[arg(long)]
    pub start_key: Option<String>,

    /// Property identifying end nodes (defaults to the end column name)
    #[arg(long)]
    pub end_key: Option<String>,

    /// Column holding start node labels
    #[arg(long)]
    pub start_label_column: Option<String>,

    /// Column holding end node labels
    #[arg(long)]
    pub end_label_column: Option<String>,

    /// Label for every start node (repeatable)
    #[arg(long = "start-label")]
    pub start_labels: Vec<String>,

    /// Label for every end node (repeatable)
    #[arg(long = "end-label")]
    pub end_labels: Vec<String>,

    /// Label for both endpoints (repeatable)
    #[arg(short, long = "label")]
    pub labels: Vec<String>,

    /// Column holding RFC 3339 timestamps to store as datetimes (repeatable)
    #[arg(long = "datetime")]
    pub datetime_columns: Vec<String>,

    /// Rows per statement (defaults to the configured batch size)
    #[arg(long)]
    pub batch_size: Option<usize>,
}

/// Translate the flags into a frame builder and build it.
pub fn build_frame(args: &EdgesArgs, table: neon_core::Table) -> Result<EdgeFrame> {
    let mut builder = EdgeFrame::builder(table).start(&args.start).end(&args.end);

    if let Some(rel_type) = &args.rel_type {
        builder = builder.rel_type(rel_type);
    }
    if let Some(column) = &args.rel_type_column {
        builder = builder.rel_type_column(column);
    }
    if let Some(key) = &args.start_key {
        builder = builder.start_key(key);
    }
    if let Some(key) = &args.end_key {
        builder = builder.end_key(key);
    }
    if let Some(column) = &args.start_label_column {
        builder = builder.start_label_column(column);
    }
    if let Some(column) = &args.end_label_column {
        builder = builder.end_label_column(column);
    }
    if let Some(labels) = label_set(&args.start_labels) {
        builder = builder.start_labels(labels);
    }
    if let Some(labels) = label_set(&args.end_labels) {
        builder = builder.end_labels(labels);
    }
    if let Some(labels) = label_set(&args.labels) {
        builder = builder.labels(labels);
    }

    Ok(builder.build()?)
}

pub async fn execute(args: EdgesArgs, ctx: &RunContext) -> Result<()> {
    let table = load_table(&args.input, &args.datetime_columns)?;
    let frame = build_frame(&args, table)?;
    let batch_size = ctx.batch_size(args.batch_size);

    if ctx.dry_run {
        for (i, statement) in edge_statements(&frame, batch_size)?.iter().enumerate() {
            output::print_statement(i + 1, statement)?;
        }
        return Ok(());
    }

    let client = ctx.connect().await?;
    let result = neon_graph::create_edges(&client, &frame, batch_size).await?;
    output::print_sync_result(&result);
    Ok(())
}
