use std::collections::HashMap;

use crate::error::GraphError;
use crate::graph::IntentGraph;

/// Validate an intent graph: every edge endpoint must exist, node ids must
/// be unique, and the induced directed graph must be acyclic. Does not
/// mutate its input.
pub fn validate(graph: &IntentGraph) -> Result<(), GraphError> {
  let index = graph.index()?;

  for entry in &graph.execution_plan.entry_points {
    if !index.upstream(entry).is_empty() {
      return Err(GraphError::InvalidEntryPoint {
        node_id: entry.clone(),
      });
    }
  }
  for exit in &graph.execution_plan.exit_points {
    if !index.downstream(exit).is_empty() {
      return Err(GraphError::InvalidExitPoint {
        node_id: exit.clone(),
      });
    }
  }

  detect_cycle(graph)
}

/// Three-color DFS cycle check. On a back edge, returns the node where the
/// cycle was detected rather than failing silently.
fn detect_cycle(graph: &IntentGraph) -> Result<(), GraphError> {
  let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
  for node in &graph.nodes {
    adjacency.entry(node.node_id.as_str()).or_default();
  }
  for edge in &graph.edges {
    if let Some(neighbors) = adjacency.get_mut(edge.from.as_str()) {
      neighbors.push(edge.to.as_str());
    }
  }

  // 0 = white (unvisited), 1 = gray (in progress), 2 = black (done)
  let mut color: HashMap<&str, u8> = adjacency.keys().map(|id| (*id, 0u8)).collect();

  fn dfs<'a>(
    node: &'a str,
    adjacency: &HashMap<&str, Vec<&'a str>>,
    color: &mut HashMap<&'a str, u8>,
  ) -> Option<&'a str> {
    color.insert(node, 1);

    if let Some(neighbors) = adjacency.get(node) {
      for &neighbor in neighbors {
        match color.get(neighbor) {
          Some(1) => return Some(neighbor),
          Some(0) => {
            if let Some(cyclic) = dfs(neighbor, adjacency, color) {
              return Some(cyclic);
            }
          }
          _ => {}
        }
      }
    }

    color.insert(node, 2);
    None
  }

  let node_ids: Vec<&str> = adjacency.keys().copied().collect();
  for node_id in node_ids {
    if color.get(node_id) == Some(&0) {
      if let Some(cyclic) = dfs(node_id, &adjacency, &mut color) {
        return Err(GraphError::CycleDetected {
          node_id: cyclic.to_string(),
        });
      }
    }
  }

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::edge::Edge;
  use crate::graph::{ExecutionPlan, ExecutionStrategy};
  use crate::node::{NodeType, OutputDecl};
  use std::collections::HashMap as Map;

  fn node(id: &str) -> crate::node::Node {
    crate::node::Node {
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

  fn graph(nodes: &[&str], edges: &[(&str, &str)], entries: &[&str], exits: &[&str]) -> IntentGraph {
    IntentGraph {
      nodes: nodes.iter().map(|n| node(n)).collect(),
      edges: edges.iter().map(|(f, t)| Edge::new(*f, *t)).collect(),
      execution_plan: ExecutionPlan {
        entry_points: entries.iter().map(|s| s.to_string()).collect(),
        exit_points: exits.iter().map(|s| s.to_string()).collect(),
        strategy: ExecutionStrategy::Hybrid,
      },
    }
  }

  #[test]
  fn linear_graph_is_valid() {
    let g = graph(&["a", "b", "c"], &[("a", "b"), ("b", "c")], &["a"], &["c"]);
    assert!(validate(&g).is_ok());
  }

  #[test]
  fn three_cycle_is_rejected() {
    let g = graph(&["a", "b", "c"], &[("a", "b"), ("b", "c"), ("c", "a")], &["a"], &["c"]);
    assert!(matches!(validate(&g), Err(GraphError::CycleDetected { .. })));
  }

  #[test]
  fn self_loop_is_rejected() {
    let g = graph(&["a"], &[("a", "a")], &["a"], &["a"]);
    assert!(matches!(validate(&g), Err(GraphError::CycleDetected { .. })));
  }

  #[test]
  fn entry_point_with_incoming_edge_is_rejected() {
    let g = graph(&["a", "b"], &[("a", "b")], &["b"], &["b"]);
    assert!(matches!(validate(&g), Err(GraphError::InvalidEntryPoint { .. })));
  }

  #[test]
  fn exit_point_with_outgoing_edge_is_rejected() {
    let g = graph(&["a", "b"], &[("a", "b")], &["a"], &["a"]);
    assert!(matches!(validate(&g), Err(GraphError::InvalidExitPoint { .. })));
  }

  #[test]
  fn diamond_graph_is_valid() {
    let g = graph(
      &["a", "b", "c", "d"],
      &[("a", "b"), ("a", "c"), ("b", "d"), ("c", "d")],
      &["a"],
      &["d"],
    );
    assert!(validate(&g).is_ok());
  }
}
