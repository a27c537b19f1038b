//! # Neon Graph
//!
//! Neo4j integration for neon frames.
//!
//! Provides the bolt client, bulk node and relationship upload,
//! uniqueness constraints and ad hoc node matching.

pub mod bolt;
pub mod client;
pub mod queries;
pub mod schema;
pub mod sync;

pub use client::{GraphClient, GraphConfig};
pub use queries::{get_counts, match_nodes, GraphCounts};
pub use schema::create_node_constraints;
pub use sync::{create_edges, create_nodes, SyncResult};
