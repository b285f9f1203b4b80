use std::collections::{HashMap, VecDeque};

use gaff_graph::IntentGraph;

use crate::error::ScheduleError;

/// Produce a linear order such that for every edge u -> v, u appears before
/// v. Dependencies come from the edge set; a node's `dependencies` field is
/// advisory only and is not consulted here.
pub fn sort(graph: &IntentGraph) -> Result<Vec<String>, ScheduleError> {
  let index = graph.index()?;
  let node_ids = index.node_ids();

  let mut in_degree: HashMap<&str, usize> = node_ids
    .iter()
    .map(|id| (*id, index.upstream(id).len()))
    .collect();

  // Deterministic ordering for nodes that become ready simultaneously.
  let mut initial: Vec<&str> = in_degree
    .iter()
    .filter(|(_, deg)| **deg == 0)
    .map(|(id, _)| *id)
    .collect();
  initial.sort_unstable();
  let mut queue: VecDeque<&str> = initial.into();

  let mut ordered = Vec::with_capacity(node_ids.len());
  while let Some(node_id) = queue.pop_front() {
    ordered.push(node_id.to_string());
    let mut newly_ready: Vec<&str> = Vec::new();
    for &downstream in index.downstream(node_id) {
      let deg = in_degree.get_mut(downstream).expect("indexed node");
      *deg -= 1;
      if *deg == 0 {
        newly_ready.push(downstream);
      }
    }
    newly_ready.sort_unstable();
    queue.extend(newly_ready);
  }

  if ordered.len() != node_ids.len() {
    return Err(ScheduleError::NoProgress {
      remaining: node_ids.len() - ordered.len(),
    });
  }

  Ok(ordered)
}

/// Partition a topological order into layers: layer 0 holds every entry
/// point (in-degree zero); layer k+1 holds every node whose predecessors
/// all lie in layers 0..=k. Nodes within a layer carry no relative order
/// and are safe to dispatch concurrently.
pub fn batch(graph: &IntentGraph, sorted: &[String]) -> Result<Vec<Vec<String>>, ScheduleError> {
  let index = graph.index()?;

  let mut layer_of: HashMap<&str, usize> = HashMap::new();
  let mut batches: Vec<Vec<String>> = Vec::new();

  for node_id in sorted {
    let layer = index
      .upstream(node_id)
      .iter()
      .map(|up| layer_of.get(up).copied().unwrap_or(0) + 1)
      .max()
      .unwrap_or(0);
    layer_of.insert(node_id.as_str(), layer);
    if batches.len() <= layer {
      batches.resize_with(layer + 1, Vec::new);
    }
    batches[layer].push(node_id.clone());
  }

  Ok(batches)
}

#[cfg(test)]
mod tests {
  use super::*;
  use gaff_graph::{Edge, ExecutionPlan, ExecutionStrategy, Node, NodeType, OutputDecl};
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

  fn graph(nodes: &[&str], edges: &[(&str, &str)]) -> IntentGraph {
    IntentGraph {
      nodes: nodes.iter().map(|n| node(n)).collect(),
      edges: edges.iter().map(|(f, t)| Edge::new(*f, *t)).collect(),
      execution_plan: ExecutionPlan {
        entry_points: vec![],
        exit_points: vec![],
        strategy: ExecutionStrategy::Hybrid,
      },
    }
  }

  #[test]
  fn linear_chain_sorts_in_order() {
    let g = graph(&["a", "b", "c"], &[("a", "b"), ("b", "c")]);
    assert_eq!(sort(&g).unwrap(), vec!["a", "b", "c"]);
  }

  #[test]
  fn linear_chain_batches_singly() {
    let g = graph(&["a", "b", "c"], &[("a", "b"), ("b", "c")]);
    let sorted = sort(&g).unwrap();
    let batches = batch(&g, &sorted).unwrap();
    assert_eq!(
      batches,
      vec![vec!["a".to_string()], vec!["b".to_string()], vec!["c".to_string()]]
    );
  }

  #[test]
  fn diamond_batches_parallel_middle() {
    let g = graph(
      &["a", "b", "c", "d"],
      &[("a", "b"), ("a", "c"), ("b", "d"), ("c", "d")],
    );
    let sorted = sort(&g).unwrap();
    let batches = batch(&g, &sorted).unwrap();
    assert_eq!(batches.len(), 3);
    assert_eq!(batches[0], vec!["a".to_string()]);
    let mut middle = batches[1].clone();
    middle.sort();
    assert_eq!(middle, vec!["b".to_string(), "c".to_string()]);
    assert_eq!(batches[2], vec!["d".to_string()]);
  }

  #[test]
  fn disconnected_nodes_share_layer_zero() {
    let g = graph(&["a", "b"], &[]);
    let sorted = sort(&g).unwrap();
    let batches = batch(&g, &sorted).unwrap();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].len(), 2);
  }
}
