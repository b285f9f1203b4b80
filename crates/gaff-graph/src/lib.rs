//! Intent graph representation and DAG validation.

mod edge;
mod error;
mod graph;
mod node;
mod validate;

pub use edge::Edge;
pub use error::GraphError;
pub use graph::{ExecutionPlan, ExecutionStrategy, IntentGraph};
pub use node::{
  InputSourceSpec, Node, NodeType, OutputDecl, RetryBackoff, RetryPolicy, HITL_AGENT, HITL_TOOL,
};
pub use validate::validate;
