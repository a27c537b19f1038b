//! Core types for loading tabular data into a property graph.
//!
//! Tables of rows are wrapped as node or edge frames, enriched with labels
//! and relationship types, encoded into bulk payloads and reconciled
//! against what the graph already holds. Nothing here talks to a database
//! directly; live access goes through [`QueryExecutor`].

pub mod cypher;
pub mod encode;
pub mod error;
pub mod executor;
pub mod frames;
pub mod labels;
pub mod node;
pub mod reconcile;
pub mod table;
pub mod value;

pub use encode::{encode_edges, encode_nodes, EdgePayload, NodePayload};
pub use error::{NeonError, NeonResult};
pub use executor::{QueryExecutor, Returns, Statement};
pub use frames::{EdgeFrame, EndpointRole, LabelSpec, NodeFrame};
pub use labels::LabelSet;
pub use node::NodeRef;
pub use reconcile::{FailurePolicy, Reconciler};
pub use table::{Cell, Record, Table};
pub use value::Value;
