//! `neon nodes`: create nodes from a table.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use tracing::info;

use neon_core::{LabelSet, NodeFrame, Reconciler};
use neon_graph::sync::node_statements;

use super::{label_set, load_table, RunContext};
use crate::output;

#[derive(Args)]
pub struct NodesArgs {
    /// CSV, JSON array or JSON-lines file (`-` reads JSON from stdin)
    pub input: PathBuf,

    /// Column holding a label or list of labels per row
    #[arg(long)]
    pub label_column: Option<String>,

    /// Label applied to every row (repeatable)
    #[arg(short, long = "label")]
    pub labels: Vec<String>,

    /// Column identifying each node
    #[arg(long)]
    pub id_column: Option<String>,

    /// Column holding RFC 3339 timestamps to store as datetimes (repeatable)
    #[arg(long = "datetime")]
    pub datetime_columns: Vec<String>,

    /// Skip rows whose value in this column already exists on a node with
    /// the given labels
    #[arg(long, value_name = "KEY")]
    pub skip_existing: Option<String>,

    /// Rows per statement (defaults to the configured batch size)
    #[arg(long)]
    pub batch_size: Option<usize>,
}

pub async fn execute(args: NodesArgs, ctx: &RunContext) -> Result<()> {
    let table = load_table(&args.input, &args.datetime_columns)?;
    let static_labels = label_set(&args.labels);

    let mut builder = NodeFrame::builder(table);
    if let Some(column) = &args.label_column {
        builder = builder.label_column(column);
    }
    if let Some(labels) = &static_labels {
        builder = builder.labels(labels.clone());
    }
    if let Some(id) = &args.id_column {
        builder = builder.id_column(id);
    }
    let mut frame = builder.build()?;
    let batch_size = ctx.batch_size(args.batch_size);

    if ctx.dry_run {
        for (i, statement) in node_statements(&frame, batch_size)?.iter().enumerate() {
            output::print_statement(i + 1, statement)?;
        }
        return Ok(());
    }

    let client = ctx.connect().await?;

    if let Some(key) = &args.skip_existing {
        let labels = static_labels.unwrap_or_else(LabelSet::new);
        let total = frame.len();
        let missing = Reconciler::new(&client)
            .with_policy(ctx.config.reconcile.on_failure)
            .anti_join(frame.table(), key, &labels)
            .await?;
        let id_column = frame.id_column().map(str::to_string);
        frame = NodeFrame::new(missing).with_id_column(id_column.as_deref())?;
        info!(total, remaining = frame.len(), "Filtered existing nodes");
        println!("{} of {} rows are new", frame.len().to_string().bold(), total);
    }

    let result = neon_graph::create_nodes(&client, &frame, batch_size).await?;
    output::print_sync_result(&result);
    Ok(())
}
