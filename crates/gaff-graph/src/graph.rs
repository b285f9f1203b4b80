use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::edge::Edge;
use crate::error::GraphError;
use crate::node::Node;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStrategy {
  Sequential,
  Parallel,
  Hybrid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionPlan {
  pub entry_points: Vec<String>,
  pub exit_points: Vec<String>,
  #[serde(default = "default_strategy")]
  pub strategy: ExecutionStrategy,
}

fn default_strategy() -> ExecutionStrategy {
  ExecutionStrategy::Hybrid
}

/// The declarative workflow graph: a node table, an edge table, and the
/// execution plan naming entry/exit points.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentGraph {
  pub nodes: Vec<Node>,
  pub edges: Vec<Edge>,
  pub execution_plan: ExecutionPlan,
}

impl IntentGraph {
  /// Build a node-id-keyed view plus adjacency/reverse-adjacency, the way
  /// `fuschia_workflow::graph::Graph` indexes a locked workflow.
  pub fn index(&self) -> Result<GraphIndex<'_>, GraphError> {
    GraphIndex::build(self)
  }
}

/// Adjacency views over an `IntentGraph`, built once and reused by the
/// validator, scheduler and injector.
pub struct GraphIndex<'g> {
  pub nodes: HashMap<&'g str, &'g Node>,
  adjacency: HashMap<&'g str, Vec<&'g str>>,
  reverse_adjacency: HashMap<&'g str, Vec<&'g str>>,
}

impl<'g> GraphIndex<'g> {
  fn build(graph: &'g IntentGraph) -> Result<Self, GraphError> {
    let mut nodes = HashMap::new();
    for node in &graph.nodes {
      if nodes.insert(node.node_id.as_str(), node).is_some() {
        return Err(GraphError::DuplicateNode {
          node_id: node.node_id.clone(),
        });
      }
    }

    let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut reverse_adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
    for id in nodes.keys() {
      adjacency.entry(id).or_default();
      reverse_adjacency.entry(id).or_default();
    }

    for edge in &graph.edges {
      let from = nodes.get(edge.from.as_str()).ok_or_else(|| GraphError::UnknownEdgeEndpoint {
        node_id: edge.from.clone(),
      })?;
      let to = nodes.get(edge.to.as_str()).ok_or_else(|| GraphError::UnknownEdgeEndpoint {
        node_id: edge.to.clone(),
      })?;
      adjacency.entry(from.node_id.as_str()).or_default().push(to.node_id.as_str());
      reverse_adjacency.entry(to.node_id.as_str()).or_default().push(from.node_id.as_str());
    }

    Ok(Self {
      nodes,
      adjacency,
      reverse_adjacency,
    })
  }

  pub fn downstream(&self, node_id: &str) -> &[&str] {
    self.adjacency.get(node_id).map(|v| v.as_slice()).unwrap_or(&[])
  }

  pub fn upstream(&self, node_id: &str) -> &[&str] {
    self.reverse_adjacency.get(node_id).map(|v| v.as_slice()).unwrap_or(&[])
  }

  pub fn node_ids(&self) -> HashSet<&str> {
    self.nodes.keys().copied().collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::node::{NodeType, OutputDecl};
  use std::collections::HashMap as Map;

  fn node(id: &str) -> Node {
    Node {
      node_id: id.into(),
      agent: "a".into(),
      tool: "t".into(),
      node_type: NodeType::Processing,
      purpose: None,
      instructions: None,
      inputs: Map::new(),
      outputs: Vec::<OutputDecl>::new(),
      timeout_ms: None,
      retry_policy: None,
      dependencies: Vec::new(),
      metadata: Map::new(),
    }
  }

  fn plan(entries: &[&str], exits: &[&str]) -> ExecutionPlan {
    ExecutionPlan {
      entry_points: entries.iter().map(|s| s.to_string()).collect(),
      exit_points: exits.iter().map(|s| s.to_string()).collect(),
      strategy: ExecutionStrategy::Hybrid,
    }
  }

  #[test]
  fn index_builds_adjacency() {
    let graph = IntentGraph {
      nodes: vec![node("a"), node("b")],
      edges: vec![Edge::new("a", "b")],
      execution_plan: plan(&["a"], &["b"]),
    };
    let idx = graph.index().unwrap();
    assert_eq!(idx.downstream("a"), &["b"]);
    assert_eq!(idx.upstream("b"), &["a"]);
    assert!(idx.downstream("b").is_empty());
  }

  #[test]
  fn duplicate_node_id_is_rejected() {
    let graph = IntentGraph {
      nodes: vec![node("a"), node("a")],
      edges: vec![],
      execution_plan: plan(&["a"], &["a"]),
    };
    assert!(matches!(graph.index(), Err(GraphError::DuplicateNode { .. })));
  }

  #[test]
  fn unknown_edge_endpoint_is_rejected() {
    let graph = IntentGraph {
      nodes: vec![node("a")],
      edges: vec![Edge::new("a", "missing")],
      execution_plan: plan(&["a"], &["a"]),
    };
    assert!(matches!(
      graph.index(),
      Err(GraphError::UnknownEdgeEndpoint { .. })
    ));
  }
}
