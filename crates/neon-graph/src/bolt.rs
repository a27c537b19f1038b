//! Conversions between neon values and Bolt wire types.

use anyhow::{anyhow, Result};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use neo4rs::{BoltBoolean, BoltFloat, BoltInteger, BoltList, BoltMap, BoltNull, BoltString, BoltType, Node, Query, Row};

use neon_core::{LabelSet, Record, Returns, Statement, Value};

/// Convert a value to its Bolt counterpart. Datetimes are sent as native
/// zoned datetimes.
pub fn to_bolt(value: &Value) -> BoltType {
    match value {
        Value::Null => BoltType::Null(BoltNull),
        Value::Bool(b) => BoltType::Boolean(BoltBoolean::new(*b)),
        Value::Integer(i) => BoltType::Integer(BoltInteger::new(*i)),
        Value::Float(f) => BoltType::Float(BoltFloat::new(*f)),
        Value::String(s) => BoltType::String(BoltString::new(s)),
        Value::DateTime(dt) => BoltType::from(*dt),
        Value::List(items) => BoltType::List(BoltList::from(items.iter().map(to_bolt).collect::<Vec<_>>())),
        Value::Map(map) => {
            let mut bolt = BoltMap::new();
            for (key, value) in map {
                bolt.put(BoltString::new(key), to_bolt(value));
            }
            BoltType::Map(bolt)
        }
    }
}

/// Convert a Bolt value back. Zoned and local datetimes come back as
/// `Value::DateTime` (local ones read as UTC), dates as ISO strings. Graph
/// structures and the remaining temporal types are rendered as their debug
/// text.
pub fn from_bolt(bolt: &BoltType) -> Value {
    match bolt {
        BoltType::Null(_) => Value::Null,
        BoltType::Boolean(b) => Value::Bool(b.value),
        BoltType::Integer(i) => Value::Integer(i.value),
        BoltType::Float(f) => Value::Float(f.value),
        BoltType::String(s) => Value::String(s.value.clone()),
        BoltType::List(items) => Value::List(items.value.iter().map(from_bolt).collect()),
        BoltType::Map(map) => Value::Map(
            map.value
                .iter()
                .map(|(key, value)| (key.value.clone(), from_bolt(value)))
                .collect(),
        ),
        BoltType::DateTime(dt) => DateTime::<FixedOffset>::try_from(dt)
            .map(Value::DateTime)
            .unwrap_or_else(|_| debug_text(bolt)),
        BoltType::DateTimeZoneId(dt) => DateTime::<FixedOffset>::try_from(dt)
            .map(Value::DateTime)
            .unwrap_or_else(|_| debug_text(bolt)),
        BoltType::LocalDateTime(dt) => NaiveDateTime::try_from(dt)
            .map(|naive| Value::DateTime(naive.and_utc().fixed_offset()))
            .unwrap_or_else(|_| debug_text(bolt)),
        BoltType::Date(date) => NaiveDate::try_from(date)
            .map(|date| Value::String(date.to_string()))
            .unwrap_or_else(|_| debug_text(bolt)),
        other => debug_text(other),
    }
}

fn debug_text(bolt: &BoltType) -> Value {
    Value::String(format!("{:?}", bolt))
}

/// Bind a statement's parameters onto a neo4rs query.
pub fn to_query(statement: &Statement) -> Query {
    statement
        .params
        .iter()
        .fold(Query::new(statement.text.clone()), |query, (name, value)| {
            query.param(name, to_bolt(value))
        })
}

/// Flatten a node into a record: a `labels` cell, then its properties.
pub fn node_to_record(node: &Node) -> Result<Record> {
    let labels: LabelSet = node.labels().into_iter().map(|label| label.to_string()).collect();
    let mut record = Record::new().with("labels", labels);
    for key in node.keys() {
        let value: BoltType = node
            .get(&key)
            .map_err(|e| anyhow!("Failed to read node property '{}': {:?}", key, e))?;
        record.insert(key.to_string(), from_bolt(&value));
    }
    Ok(record)
}

/// Read one result row according to the statement's declared shape.
pub fn row_to_record(row: &Row, returns: &Returns) -> Result<Record> {
    match returns {
        Returns::Nothing => Ok(Record::new()),
        Returns::Nodes(alias) => {
            let node: Node = row
                .get(alias)
                .map_err(|e| anyhow!("Failed to get node '{}': {:?}", alias, e))?;
            node_to_record(&node)
        }
        Returns::Fields(fields) => fields
            .iter()
            .map(|field| {
                let value: BoltType = row
                    .get(field)
                    .map_err(|e| anyhow!("Failed to get field '{}': {:?}", field, e))?;
                Ok((field.clone(), from_bolt(&value)))
            })
            .collect(),
    }
}
