//! `neon diff`: compare a local table against the graph.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use neon_core::reconcile::exists_statement;
use neon_core::{LabelSet, Reconciler};

use super::{label_set, load_table, RunContext};
use crate::output;

#[derive(Args)]
pub struct DiffArgs {
    /// CSV, JSON array or JSON-lines file (`-` reads JSON from stdin)
    pub input: PathBuf,

    /// Column matched against the node property of the same name
    #[arg(long)]
    pub key: String,

    /// Label the remote nodes must carry (repeatable)
    #[arg(short, long = "label")]
    pub labels: Vec<String>,

    /// Show the remote nodes that match instead of the missing rows
    #[arg(long)]
    pub present: bool,

    /// Print rows as JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

pub async fn execute(args: DiffArgs, ctx: &RunContext) -> Result<()> {
    let table = load_table(&args.input, &[])?;
    let labels = label_set(&args.labels).unwrap_or_else(LabelSet::new);

    if ctx.dry_run {
        return output::print_statement(1, &exists_statement(&table, &args.key, &labels)?);
    }

    let client = ctx.connect().await?;
    let reconciler = Reconciler::new(&client).with_policy(ctx.config.reconcile.on_failure);

    let rows = if args.present {
        reconciler.semi_join(&table, &args.key, &labels).await?
    } else {
        reconciler.anti_join(&table, &args.key, &labels).await?
    };

    if args.json {
        return output::print_json(&rows);
    }

    output::print_table(&rows);
    let what = if args.present { "already in the graph" } else { "missing from the graph" };
    println!("{} of {} local rows {}", rows.len().to_string().bold(), table.len(), what);
    Ok(())
}
