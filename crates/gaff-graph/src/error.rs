use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
  #[error("duplicate node id: {node_id}")]
  DuplicateNode { node_id: String },

  #[error("edge references unknown node: {node_id}")]
  UnknownEdgeEndpoint { node_id: String },

  #[error("graph contains a cycle through node: {node_id}")]
  CycleDetected { node_id: String },

  #[error("entry point {node_id} has an incoming edge")]
  InvalidEntryPoint { node_id: String },

  #[error("exit point {node_id} has an outgoing edge")]
  InvalidExitPoint { node_id: String },
}
