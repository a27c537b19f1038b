//! Wire payloads for bulk node and relationship creation.
//!
//! Payloads are built from upload-ready frames only. Null cells are
//! dropped because the graph store does not persist null properties.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::cypher::{self, EDGES_PARAM, NODES_PARAM};
use crate::error::{NeonError, NeonResult};
use crate::executor::Statement;
use crate::frames::{EdgeFrame, NodeFrame, LABELS_COLUMN};
use crate::value::Value;

/// One node to create: its labels and its non-null properties.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodePayload {
    pub labels: Vec<String>,
    pub properties: BTreeMap<String, Value>,
}

impl NodePayload {
    pub fn to_value(&self) -> Value {
        Value::Map(BTreeMap::from([
            ("labels".to_string(), Value::from(self.labels.clone())),
            ("properties".to_string(), Value::Map(self.properties.clone())),
        ]))
    }
}

/// One relationship to merge, with both endpoints reduced to labels and a
/// single-entry identity map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgePayload {
    pub rel_type: String,
    pub start_id: BTreeMap<String, Value>,
    pub end_id: BTreeMap<String, Value>,
    pub start_labels: Vec<String>,
    pub end_labels: Vec<String>,
    pub properties: BTreeMap<String, Value>,
}

impl EdgePayload {
    pub fn to_value(&self) -> Value {
        Value::Map(BTreeMap::from([
            ("rel_type".to_string(), Value::from(self.rel_type.clone())),
            ("start_id".to_string(), Value::Map(self.start_id.clone())),
            ("end_id".to_string(), Value::Map(self.end_id.clone())),
            ("start_labels".to_string(), Value::from(self.start_labels.clone())),
            ("end_labels".to_string(), Value::from(self.end_labels.clone())),
            ("properties".to_string(), Value::Map(self.properties.clone())),
        ]))
    }
}

/// Encode every row of a labelled node frame.
pub fn encode_nodes(frame: &NodeFrame) -> NeonResult<Vec<NodePayload>> {
    if !frame.is_upload_ready() {
        return Err(NeonError::not_ready("node frame has no labels column"));
    }

    Ok(frame
        .to_records(true)
        .map(|record| {
            let mut payload = NodePayload {
                labels: Vec::new(),
                properties: BTreeMap::new(),
            };
            for (name, cell) in record {
                if name == LABELS_COLUMN {
                    payload.labels = cell.as_labels().map(|l| l.to_vec()).unwrap_or_default();
                } else {
                    payload.properties.insert(name, cell.to_value());
                }
            }
            payload
        })
        .collect())
}

/// Encode every row of an edge frame. Fails on the first row lacking a
/// relationship type or a resolved endpoint.
pub fn encode_edges(frame: &EdgeFrame) -> NeonResult<Vec<EdgePayload>> {
    if !frame.has_rel_type() {
        return Err(NeonError::not_ready("edge frame has no relationship type"));
    }

    let table = frame.table();
    (0..frame.len())
        .map(|row| {
            let rel_type = frame
                .rel_type(row)
                .ok_or_else(|| NeonError::not_ready(format!("row {} has no relationship type", row)))?;
            let unresolved = |column: &str| NeonError::UnresolvedEndpoint {
                column: column.to_string(),
                row,
            };
            let start = frame.start(row).ok_or_else(|| unresolved(frame.start_column()))?;
            let end = frame.end(row).ok_or_else(|| unresolved(frame.end_column()))?;

            let properties = frame
                .property_columns()
                .filter_map(|column| {
                    let cell = table.cell(row, column)?;
                    (!cell.is_null()).then(|| (column.to_string(), cell.to_value()))
                })
                .collect();

            Ok(EdgePayload {
                rel_type: rel_type.to_string(),
                start_id: start.identity_map(),
                end_id: end.identity_map(),
                start_labels: start.labels().to_vec(),
                end_labels: end.labels().to_vec(),
                properties,
            })
        })
        .collect()
}

/// Bind a batch of node payloads to the bulk creation template.
pub fn nodes_statement(payloads: &[NodePayload]) -> Statement {
    let batch = Value::List(payloads.iter().map(NodePayload::to_value).collect());
    Statement::new(cypher::node_create_query(NODES_PARAM))
        .param(NODES_PARAM, batch)
        .returning_fields(["created"])
}

/// Bind a batch of edge payloads to the bulk merge template.
pub fn edges_statement(payloads: &[EdgePayload]) -> Statement {
    let batch = Value::List(payloads.iter().map(EdgePayload::to_value).collect());
    Statement::new(cypher::edge_create_query(EDGES_PARAM))
        .param(EDGES_PARAM, batch)
        .returning_fields(["created"])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frames::LabelSpec;
    use crate::labels::LabelSet;
    use crate::table::{Record, Table};

    fn people() -> Table {
        Table::from_records(vec![
            Record::new().with("name", "Ada").with("email", Value::Null),
            Record::new().with("name", "Grace").with("email", "grace@navy.mil"),
        ])
    }

    #[test]
    fn test_encode_nodes_drops_nulls() {
        let frame = NodeFrame::new(people()).with_labels(LabelSpec::fixed("Person")).unwrap();
        let payloads = encode_nodes(&frame).unwrap();
        assert_eq!(payloads.len(), 2);
        assert_eq!(payloads[0].labels, vec!["Person"]);
        assert_eq!(payloads[0].properties.len(), 1);
        assert!(!payloads[0].properties.contains_key(LABELS_COLUMN));
        assert_eq!(payloads[1].properties["email"], Value::from("grace@navy.mil"));
    }

    #[test]
    fn test_endpoint_nodes_encode_scalar_identities() {
        let table = Table::from_records(vec![
            Record::new().with("start", "a").with("end", "b"),
            Record::new().with("start", "b").with("end", "c"),
        ]);
        let edges = EdgeFrame::builder(table)
            .rel_type("KNOWS")
            .start_key("name")
            .end_key("name")
            .labels("Person")
            .build()
            .unwrap();
        assert!(edges.endpoints_fully_resolved());

        let nodes = edges.to_node_frame("name", Some(LabelSet::from("Person"))).unwrap();
        let payloads = encode_nodes(&nodes).unwrap();
        let names: Vec<_> = payloads.iter().map(|p| p.properties["name"].clone()).collect();
        assert_eq!(names, vec![Value::from("a"), Value::from("b"), Value::from("c")]);
        assert!(payloads.iter().all(|p| p.labels == vec!["Person"]));
    }

    #[test]
    fn test_encode_nodes_requires_labels() {
        let frame = NodeFrame::new(people());
        assert!(matches!(encode_nodes(&frame), Err(NeonError::UploadNotReady(_))));
    }

    #[test]
    fn test_encode_edges() {
        let table = Table::from_records(vec![Record::new()
            .with("start", "ada")
            .with("end", "grace")
            .with("weight", 0.5)
            .with("note", Value::Null)]);
        let frame = EdgeFrame::builder(table)
            .rel_type("KNOWS")
            .start_key("name")
            .end_key("name")
            .start_labels("Person")
            .end_labels(["Person", "Admiral"])
            .build()
            .unwrap();

        let payloads = encode_edges(&frame).unwrap();
        let edge = &payloads[0];
        assert_eq!(edge.rel_type, "KNOWS");
        assert_eq!(edge.start_id, BTreeMap::from([("name".to_string(), Value::from("ada"))]));
        assert_eq!(edge.end_labels, vec!["Person", "Admiral"]);
        assert_eq!(edge.properties, BTreeMap::from([("weight".to_string(), Value::Float(0.5))]));
    }

    #[test]
    fn test_encode_edges_reports_unresolved_endpoint() {
        let table = Table::from_records(vec![
            Record::new().with("start", 1i64).with("end", 2i64),
            Record::new().with("start", 3i64).with("end", Value::Null),
        ]);
        let frame = EdgeFrame::builder(table)
            .rel_type("LINKS")
            .labels("Page")
            .build()
            .unwrap();
        match encode_edges(&frame) {
            Err(NeonError::UnresolvedEndpoint { column, row }) => {
                assert_eq!(column, "end");
                assert_eq!(row, 1);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_encode_edges_requires_rel_type() {
        let table = Table::from_records(vec![Record::new().with("start", 1i64).with("end", 2i64)]);
        let frame = EdgeFrame::builder(table).labels("Page").build().unwrap();
        assert!(matches!(encode_edges(&frame), Err(NeonError::UploadNotReady(_))));
    }

    #[test]
    fn test_statements_bind_batch() {
        let frame = NodeFrame::new(people()).with_labels(LabelSpec::fixed(LabelSet::from("Person"))).unwrap();
        let stmt = nodes_statement(&encode_nodes(&frame).unwrap());
        assert!(stmt.text.contains("apoc.create.node"));
        match stmt.params.get(NODES_PARAM) {
            Some(Value::List(items)) => assert_eq!(items.len(), 2),
            other => panic!("unexpected param: {:?}", other),
        }
    }
}
