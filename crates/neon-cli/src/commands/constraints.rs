//! `neon constraints`: ensure uniqueness constraints.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use neon_graph::schema::constraint_statements;

use super::{load_table, RunContext};
use crate::output;

#[derive(Args)]
pub struct ConstraintsArgs {
    /// Table with one row per constraint
    pub input: PathBuf,

    /// Column holding the label or labels to constrain
    #[arg(long, default_value = "labels")]
    pub labels_column: String,

    /// Column holding the property that must be unique
    #[arg(long, default_value = "property")]
    pub property_column: String,
}

pub async fn execute(args: ConstraintsArgs, ctx: &RunContext) -> Result<()> {
    let table = load_table(&args.input, &[])?;

    if ctx.dry_run {
        let statements = constraint_statements(&table, &args.labels_column, &args.property_column)?;
        for (i, (_, statement)) in statements.iter().enumerate() {
            output::print_statement(i + 1, statement)?;
        }
        return Ok(());
    }

    let client = ctx.connect().await?;
    let count =
        neon_graph::create_node_constraints(&client, &table, &args.labels_column, &args.property_column).await?;
    println!("{} {} constraints ensured", "✓".green(), count.to_string().bold());
    Ok(())
}
