//! Reading tables and property filters from the command line.

use std::collections::BTreeMap;
use std::fs;
use std::io::Read;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use csv::ReaderBuilder;

use neon_core::{Record, Table, Value};

/// Read a table from CSV (`.csv`), JSON lines (`.jsonl`, `.ndjson`) or a
/// JSON array of objects. A path of `-` reads stdin, which may hold either
/// JSON format.
pub fn read_table(path: &Path) -> Result<Table> {
    let raw = if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf).context("Failed to read stdin")?;
        buf
    } else {
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?
    };

    let parsed = match path.extension().and_then(|ext| ext.to_str()) {
        Some("csv") => parse_csv(raw.as_bytes()),
        Some("jsonl" | "ndjson") => parse_table(&raw, true),
        _ => parse_table(&raw, false),
    };
    parsed.with_context(|| format!("Failed to parse {}", path.display()))
}

/// Parse CSV with a header row. Headers become columns in order, empty fields
/// become null and the rest are read as integer, float or bool when they
/// parse, as strings otherwise.
pub fn parse_csv<R: Read>(reader: R) -> Result<Table> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(reader);
    let headers = reader.headers().context("Failed to read CSV header")?.clone();

    let mut table = Table::new(headers.iter())?;
    for (i, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Invalid CSV on row {}", i + 1))?;
        let row: Record = headers
            .iter()
            .zip(record.iter())
            .map(|(name, field)| (name, csv_value(field)))
            .collect();
        table.push_row(row)?;
    }
    Ok(table)
}

fn csv_value(field: &str) -> Value {
    if field.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = field.parse::<i64>() {
        return Value::Integer(i);
    }
    match field.parse::<f64>() {
        Ok(f) if f.is_finite() => Value::Float(f),
        _ => field.parse::<bool>().map(Value::Bool).unwrap_or_else(|_| Value::from(field)),
    }
}

/// Parse a JSON document into a table. Without `lines`, a document that is
/// not an array is retried as JSON lines.
pub fn parse_table(raw: &str, lines: bool) -> Result<Table> {
    if !lines {
        if let Ok(json @ serde_json::Value::Array(_)) = serde_json::from_str::<serde_json::Value>(raw) {
            return Ok(Table::from_json(json)?);
        }
    }

    let items = raw
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| serde_json::from_str(line).with_context(|| format!("Invalid JSON on line {}", i + 1)))
        .collect::<Result<Vec<serde_json::Value>>>()?;
    Ok(Table::from_json(serde_json::Value::Array(items))?)
}

/// Parse `key=value` pairs. Values are read as JSON when they parse
/// (`age=36`, `active=true`), and as plain strings otherwise.
pub fn parse_properties(pairs: &[String]) -> Result<BTreeMap<String, Value>> {
    pairs
        .iter()
        .map(|pair| -> Result<(String, Value)> {
            let (key, raw) = pair
                .split_once('=')
                .ok_or_else(|| anyhow!("Expected key=value, got '{}'", pair))?;
            let value = serde_json::from_str::<serde_json::Value>(raw)
                .map(Value::from)
                .unwrap_or_else(|_| Value::from(raw));
            Ok((key.trim().to_string(), value))
        })
        .collect()
}
