//! Terminal output formatting.

use colored::Colorize;
use unicode_width::UnicodeWidthStr;

use neon_core::{Cell, Statement, Table, Value};
use neon_graph::{GraphCounts, SyncResult};

/// Widest rendered column before truncation.
const MAX_COLUMN_WIDTH: usize = 32;

/// Render a cell for a table view.
fn render_cell(cell: &Cell) -> String {
    match cell {
        Cell::Value(Value::Null) => String::new(),
        Cell::Value(Value::String(s)) => s.clone(),
        Cell::Labels(labels) => labels.iter().map(|l| format!(":{}", l)).collect(),
        Cell::Node(node) => node.to_string(),
        other => other.to_value().to_json().to_string(),
    }
}

/// Truncate to a display width, accounting for wide characters.
fn truncate_visual(s: &str, max_width: usize) -> String {
    if UnicodeWidthStr::width(s) <= max_width {
        return s.to_string();
    }
    if max_width <= 3 {
        return ".".repeat(max_width);
    }
    let mut result = String::new();
    let mut current_width = 0;
    for ch in s.chars() {
        let ch_width = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if current_width + ch_width > max_width - 3 {
            break;
        }
        result.push(ch);
        current_width += ch_width;
    }
    result.push_str("...");
    result
}

fn pad(s: &str, width: usize) -> String {
    let fill = width.saturating_sub(UnicodeWidthStr::width(s));
    format!("{}{}", s, " ".repeat(fill))
}

/// Print a table with a bold header and aligned columns.
pub fn print_table(table: &Table) {
    if table.is_empty() {
        println!("{}", "No rows.".dimmed());
        return;
    }

    let rendered: Vec<Vec<String>> = table
        .rows()
        .map(|row| row.map(|(_, cell)| truncate_visual(&render_cell(cell), MAX_COLUMN_WIDTH)).collect())
        .collect();

    let widths: Vec<usize> = table
        .columns()
        .iter()
        .enumerate()
        .map(|(i, name)| {
            rendered
                .iter()
                .map(|row| UnicodeWidthStr::width(row[i].as_str()))
                .chain(std::iter::once(UnicodeWidthStr::width(name.as_str())))
                .max()
                .unwrap_or(0)
                .min(MAX_COLUMN_WIDTH)
        })
        .collect();

    let header: Vec<String> = table
        .columns()
        .iter()
        .zip(&widths)
        .map(|(name, width)| pad(&truncate_visual(name, *width), *width))
        .collect();
    println!("{}", header.join("  ").bold());
    println!("{}", "─".repeat(widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1)));

    for row in &rendered {
        let line: Vec<String> = row.iter().zip(&widths).map(|(cell, width)| pad(cell, *width)).collect();
        println!("{}", line.join("  "));
    }

    println!("\n{} rows", table.len().to_string().bold());
}

/// Rows as a JSON array of objects.
pub fn table_to_json(table: &Table, drop_nulls: bool) -> serde_json::Value {
    serde_json::Value::Array(table.to_records(drop_nulls).map(|record| record.to_value().to_json()).collect())
}

/// Print rows as pretty JSON on stdout.
pub fn print_json(table: &Table) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(&table_to_json(table, true))?);
    Ok(())
}

/// Print a statement and its parameters instead of running it.
pub fn print_statement(index: usize, statement: &Statement) -> anyhow::Result<()> {
    println!("{} {}", "Statement".bold(), index.to_string().cyan());
    println!("{}", statement.text.trim());
    if !statement.params.is_empty() {
        let params: serde_json::Map<String, serde_json::Value> = statement
            .params
            .iter()
            .map(|(name, value)| (name.clone(), value.to_json()))
            .collect();
        println!("{}", "Parameters".dimmed());
        println!("{}", serde_json::to_string_pretty(&params)?);
    }
    println!();
    Ok(())
}

pub fn print_sync_result(result: &SyncResult) {
    println!("\n{}", "Upload complete:".green().bold());
    if result.nodes_created > 0 {
        println!("  Nodes created:         {}", result.nodes_created);
    }
    if result.relationships_created > 0 {
        println!("  Relationships created: {}", result.relationships_created);
    }
    println!("  Batches:               {}", result.batches);
}

pub fn print_counts(counts: &GraphCounts) {
    println!("{}", "Graph status".bold());
    println!("{}", "─".repeat(30));
    println!("  {:<16} {}", "Nodes:", counts.nodes.to_string().cyan());
    println!("  {:<16} {}", "Relationships:", counts.relationships.to_string().cyan());
}

#[cfg(test)]
mod tests {
    use super::*;
    use neon_core::{LabelSet, NodeRef, Record};

    #[test]
    fn test_truncate_visual() {
        assert_eq!(truncate_visual("short", 10), "short");
        assert_eq!(truncate_visual("a long column value", 10), "a long ...");
        assert_eq!(truncate_visual("abcdef", 3), "...");
    }

    #[test]
    fn test_render_cell() {
        assert_eq!(render_cell(&Cell::null()), "");
        assert_eq!(render_cell(&Cell::from("Ada")), "Ada");
        assert_eq!(render_cell(&Cell::from(36i64)), "36");
        assert_eq!(render_cell(&Cell::from(LabelSet::from(["Person", "Admin"]))), ":Person:Admin");
        let node = NodeRef::new(LabelSet::from("Person"), "id", 1i64);
        assert_eq!(render_cell(&Cell::from(node)), "(n:Person {id: 1})");
    }

    #[test]
    fn test_table_to_json() {
        let table = Table::from_records(vec![
            Record::new().with("labels", LabelSet::from("Person")).with("name", "Ada"),
            Record::new().with("labels", LabelSet::from("Person")),
        ]);
        let json = table_to_json(&table, true);
        assert_eq!(json[0]["labels"], serde_json::json!(["Person"]));
        assert_eq!(json[0]["name"], "Ada");
        assert!(json[1].get("name").is_none());
    }
}
