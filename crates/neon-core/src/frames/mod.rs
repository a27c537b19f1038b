//! Node and edge frames: tables with graph semantics.

mod edge_frame;
mod label_spec;
mod node_frame;

pub use edge_frame::{EdgeFrame, EdgeFrameBuilder, EndpointRole, REL_TYPE_COLUMN, RESOLUTION_SAMPLE};
pub use label_spec::LabelSpec;
pub use node_frame::{NodeFrame, NodeFrameBuilder, LABELS_COLUMN};
