//! Cypher query templates.
//!
//! Every function here is pure string formatting. Bulk templates read a
//! single list parameter; the caller binds the payload at execution time.

use std::collections::BTreeMap;

use crate::labels::LabelSet;
use crate::value::Value;

/// Parameter name carrying node payloads.
pub const NODES_PARAM: &str = "nodes";

/// Parameter name carrying edge payloads.
pub const EDGES_PARAM: &str = "edges";

/// Quote an identifier with backticks unless it is a plain Cypher name.
pub fn quote_identifier(name: &str) -> String {
    let mut chars = name.chars();
    let plain = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if plain {
        name.to_string()
    } else {
        format!("`{}`", name.replace('`', "``"))
    }
}

/// Render a value as a Cypher literal. Strings are double-quoted, other
/// scalars are rendered verbatim.
pub fn literal(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Integer(i) => i.to_string(),
        // Debug keeps the fractional part, so 1.0 stays a float in Cypher.
        Value::Float(f) => format!("{:?}", f),
        Value::String(s) => quote_string(s),
        Value::DateTime(dt) => format!("datetime({})", quote_string(&dt.to_rfc3339())),
        Value::List(items) => {
            let items: Vec<String> = items.iter().map(literal).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Map(map) => format!("{{{}}}", format_properties(map)),
    }
}

fn quote_string(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Format node labels for a pattern, e.g. `:Person:Customer`.
///
/// With `limit`, only the first `limit` labels are rendered. An empty set
/// renders as the empty string.
pub fn format_labels(labels: &LabelSet, limit: Option<usize>) -> String {
    labels
        .iter()
        .take(limit.unwrap_or(usize::MAX))
        .map(|label| format!(":{}", quote_identifier(label)))
        .collect()
}

/// Format a property map body, e.g. `name: "Ada", age: 36`.
pub fn format_properties(properties: &BTreeMap<String, Value>) -> String {
    properties
        .iter()
        .map(|(k, v)| format!("{}: {}", quote_identifier(k), literal(v)))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Bulk node creation. Each element of `$param` carries `labels` and
/// `properties`.
pub fn node_create_query(param: &str) -> String {
    format!(
        "UNWIND ${param} AS n
         CALL apoc.create.node(n.labels, n.properties) YIELD node
         RETURN count(node) AS created"
    )
}

/// Bulk relationship creation: merge both endpoints by labels and identity,
/// then merge the typed relationship between them.
pub fn edge_create_query(param: &str) -> String {
    format!(
        "UNWIND ${param} AS edge
         CALL apoc.merge.node(edge.start_labels, edge.start_id) YIELD node AS start
         WITH start, edge
         CALL apoc.merge.node(edge.end_labels, edge.end_id) YIELD node AS end
         WITH start, end, edge
         CALL apoc.merge.relationship(start, edge.rel_type, edge.properties, {{}}, end) YIELD rel
         RETURN count(rel) AS created"
    )
}

/// Uniqueness constraint on `property` for nodes carrying `labels`.
pub fn unique_constraint_query(labels: &LabelSet, property: &str) -> String {
    format!(
        "CREATE CONSTRAINT IF NOT EXISTS FOR (n{}) REQUIRE n.{} IS UNIQUE",
        format_labels(labels, None),
        quote_identifier(property)
    )
}

/// Batched existence check: match every element of `$param` by `field`
/// among nodes carrying `labels`. Returns the nodes as `n`, or only the
/// field when `only_field` is set.
pub fn exists_query(param: &str, labels: &LabelSet, field: &str, only_field: bool) -> String {
    let field = quote_identifier(field);
    let returns = if only_field {
        format!("n.{field} AS {field}")
    } else {
        "n".to_string()
    };
    format!(
        "UNWIND ${param} AS node
         MATCH (n{} {{{field}: node.{field}}})
         RETURN {returns}",
        format_labels(labels, None)
    )
}

/// Ad hoc match on labels and literal properties, with an optional limit.
pub fn node_match_query(labels: &LabelSet, properties: &BTreeMap<String, Value>, limit: Option<usize>) -> String {
    let mut query = format!("MATCH (n{}", format_labels(labels, None));
    if !properties.is_empty() {
        query.push_str(&format!(" {{{}}}", format_properties(properties)));
    }
    query.push_str(") RETURN n");
    if let Some(limit) = limit {
        query.push_str(&format!(" LIMIT {}", limit));
    }
    query
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(pairs: &[(&str, Value)]) -> BTreeMap<String, Value> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn test_format_labels() {
        let labels = LabelSet::from(["Person", "Customer"]);
        assert_eq!(format_labels(&labels, None), ":Person:Customer");
        assert_eq!(format_labels(&labels, Some(1)), ":Person");
        assert_eq!(format_labels(&LabelSet::new(), None), "");
    }

    #[test]
    fn test_format_labels_quotes_odd_names() {
        let labels = LabelSet::from("Big Company");
        assert_eq!(format_labels(&labels, None), ":`Big Company`");
    }

    #[test]
    fn test_literals() {
        assert_eq!(literal(&Value::from("Ada")), "\"Ada\"");
        assert_eq!(literal(&Value::from("say \"hi\"")), "\"say \\\"hi\\\"\"");
        assert_eq!(literal(&Value::Integer(3)), "3");
        assert_eq!(literal(&Value::Float(1.0)), "1.0");
        assert_eq!(literal(&Value::Bool(true)), "true");
        assert_eq!(literal(&Value::from(vec![1i64, 2])), "[1, 2]");
    }

    #[test]
    fn test_format_properties() {
        let p = props(&[("name", Value::from("Ada")), ("age", Value::Integer(36))]);
        assert_eq!(format_properties(&p), "age: 36, name: \"Ada\"");
    }

    #[test]
    fn test_unique_constraint_query() {
        let q = unique_constraint_query(&LabelSet::from("Person"), "email");
        assert_eq!(q, "CREATE CONSTRAINT IF NOT EXISTS FOR (n:Person) REQUIRE n.email IS UNIQUE");
    }

    #[test]
    fn test_exists_query_shapes() {
        let labels = LabelSet::from("Person");
        let q = exists_query(NODES_PARAM, &labels, "name", false);
        assert!(q.starts_with("UNWIND $nodes AS node"));
        assert!(q.contains("MATCH (n:Person {name: node.name})"));
        assert!(q.ends_with("RETURN n"));

        let q = exists_query(NODES_PARAM, &LabelSet::new(), "name", true);
        assert!(q.contains("MATCH (n {name: node.name})"));
        assert!(q.ends_with("RETURN n.name AS name"));
    }

    #[test]
    fn test_node_match_query() {
        let labels = LabelSet::from("Person");
        let p = props(&[("name", Value::from("Ada"))]);
        assert_eq!(
            node_match_query(&labels, &p, Some(5)),
            "MATCH (n:Person {name: \"Ada\"}) RETURN n LIMIT 5"
        );
        assert_eq!(node_match_query(&LabelSet::new(), &BTreeMap::new(), None), "MATCH (n) RETURN n");
    }

    #[test]
    fn test_bulk_templates_use_single_parameter() {
        let nodes = node_create_query(NODES_PARAM);
        assert!(nodes.contains("UNWIND $nodes AS n"));
        assert!(nodes.contains("apoc.create.node(n.labels, n.properties)"));

        let edges = edge_create_query(EDGES_PARAM);
        assert!(edges.contains("UNWIND $edges AS edge"));
        assert!(edges.contains("apoc.merge.node(edge.start_labels, edge.start_id)"));
        assert!(edges.contains("apoc.merge.node(edge.end_labels, edge.end_id)"));
        assert!(edges.contains("apoc.merge.relationship(start, edge.rel_type"));
    }
}
