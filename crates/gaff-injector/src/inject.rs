use std::collections::HashMap;

use gaff_card::OrchestrationCard;
use gaff_graph::{Edge, ExecutionPlan, IntentGraph, Node, NodeType};

const AUTO_INJECTED_AGENT: &str = "gaff-tools";

/// Rewrite a user-authored graph to include prepended safety validators, an
/// appended quality validator, an optional output-safety check, and an
/// optional audit terminator — all driven by the card's `quality_requirements`
/// and `safety_requirements` blocks. Purely functional: `graph`
/// is never mutated, and if neither block is enabled the input is returned
/// unchanged (injection must preserve semantics when disabled).
pub fn inject(graph: &IntentGraph, card: &OrchestrationCard) -> IntentGraph {
  let quality_enabled = card
    .quality_requirements
    .as_ref()
    .map(|q| q.enabled)
    .unwrap_or(false);
  let safety_enabled = card
    .safety_requirements
    .as_ref()
    .map(|s| s.enabled)
    .unwrap_or(false);

  if !quality_enabled && !safety_enabled {
    return graph.clone();
  }

  let mut nodes = graph.nodes.clone();
  let mut edges = graph.edges.clone();

  let prefix_ids = build_prefix(card, &mut nodes, &mut edges, &graph.execution_plan.entry_points);
  let suffix_ids = build_suffix(card, &mut nodes, &mut edges, &graph.execution_plan.exit_points);

  let entry_points = match prefix_ids.first() {
    Some(first) => vec![first.clone()],
    None => graph.execution_plan.entry_points.clone(),
  };
  let exit_points = match suffix_ids.last() {
    Some(last) => vec![last.clone()],
    None => graph.execution_plan.exit_points.clone(),
  };

  IntentGraph {
    nodes,
    edges,
    execution_plan: ExecutionPlan {
      entry_points,
      exit_points,
      strategy: graph.execution_plan.strategy,
    },
  }
}

/// Prepend `_safety_input_validation` then `_safety_compliance_check` (in
/// that fixed order), chain them sequentially, and wire the last prefix
/// node to every original entry point. Returns the ids of the nodes that
/// were prepended, in order.
fn build_prefix(
  card: &OrchestrationCard,
  nodes: &mut Vec<Node>,
  edges: &mut Vec<Edge>,
  original_entries: &[String],
) -> Vec<String> {
  let Some(safety) = &card.safety_requirements else {
    return Vec::new();
  };

  let mut chain = Vec::new();
  if safety.input_validation.is_some() {
    chain.push(push_injected_node(nodes, "_safety_input_validation", "safety_input_validation"));
  }
  if !safety.compliance_standards.is_empty() {
    chain.push(push_injected_node(nodes, "_safety_compliance_check", "safety_compliance_check"));
  }

  for pair in chain.windows(2) {
    edges.push(Edge::new(pair[0].clone(), pair[1].clone()));
  }
  if let Some(last) = chain.last() {
    for entry in original_entries {
      edges.push(Edge::new(last.clone(), entry.clone()));
    }
  }

  chain
}

/// Append `_quality_validator` after every original exit, then
/// `_safety_output_validation` after that (or after the original exits if
/// no quality node was added), then `_safety_audit_logger` as the final
/// exit. Returns the ids of the nodes that were appended, in order.
fn build_suffix(
  card: &OrchestrationCard,
  nodes: &mut Vec<Node>,
  edges: &mut Vec<Edge>,
  original_exits: &[String],
) -> Vec<String> {
  let mut chain: Vec<String> = Vec::new();
  let mut predecessors: Vec<String> = original_exits.to_vec();

  let quality_wants_validator = card
    .quality_requirements
    .as_ref()
    .map(|q| q.enabled && q.auto_validate)
    .unwrap_or(false);
  if quality_wants_validator {
    let id = push_injected_node(nodes, "_quality_validator", "quality_validator");
    for pred in &predecessors {
      edges.push(Edge::new(pred.clone(), id.clone()));
    }
    predecessors = vec![id.clone()];
    chain.push(id);
  }

  if let Some(safety) = &card.safety_requirements {
    if safety.output_validation {
      let id = push_injected_node(nodes, "_safety_output_validation", "safety_output_validation");
      for pred in &predecessors {
        edges.push(Edge::new(pred.clone(), id.clone()));
      }
      predecessors = vec![id.clone()];
      chain.push(id);
    }

    if safety.audit_logging {
      let id = push_injected_node(nodes, "_safety_audit_logger", "safety_audit_logger");
      for pred in &predecessors {
        edges.push(Edge::new(pred.clone(), id.clone()));
      }
      chain.push(id);
    }
  }

  chain
}

fn push_injected_node(nodes: &mut Vec<Node>, id: &str, tool: &str) -> String {
  let mut metadata = HashMap::new();
  metadata.insert("auto-injected".to_string(), serde_json::Value::Bool(true));

  nodes.push(Node {
    node_id: id.to_string(),
    agent: AUTO_INJECTED_AGENT.to_string(),
    tool: tool.to_string(),
    node_type: NodeType::Processing,
    purpose: Some(format!("auto-injected {tool} gate")),
    instructions: None,
    inputs: HashMap::new(),
    outputs: Vec::new(),
    timeout_ms: None,
    retry_policy: None,
    dependencies: Vec::new(),
    metadata,
  });
  id.to_string()
}

/// Strip every `_`-prefixed auto-injected node (and edges touching it),
/// recovering the original graph — the inverse of `inject`.
pub fn strip_injected(graph: &IntentGraph) -> IntentGraph {
  let injected_ids: std::collections::HashSet<&str> = graph
    .nodes
    .iter()
    .filter(|n| n.is_auto_injected())
    .map(|n| n.node_id.as_str())
    .collect();

  let nodes: Vec<Node> = graph
    .nodes
    .iter()
    .filter(|n| !injected_ids.contains(n.node_id.as_str()))
    .cloned()
    .collect();
  let edges: Vec<Edge> = graph
    .edges
    .iter()
    .filter(|e| !injected_ids.contains(e.from.as_str()) && !injected_ids.contains(e.to.as_str()))
    .cloned()
    .collect();

  let entry_points: Vec<String> = graph
    .execution_plan
    .entry_points
    .iter()
    .filter(|id| !injected_ids.contains(id.as_str()))
    .cloned()
    .collect();
  let exit_points: Vec<String> = graph
    .execution_plan
    .exit_points
    .iter()
    .filter(|id| !injected_ids.contains(id.as_str()))
    .cloned()
    .collect();

  let entry_points = if entry_points.is_empty() {
    nodes
      .iter()
      .filter(|n| !edges.iter().any(|e| e.to == n.node_id))
      .map(|n| n.node_id.clone())
      .collect()
  } else {
    entry_points
  };
  let exit_points = if exit_points.is_empty() {
    nodes
      .iter()
      .filter(|n| !edges.iter().any(|e| e.from == n.node_id))
      .map(|n| n.node_id.clone())
      .collect()
  } else {
    exit_points
  };

  IntentGraph {
    nodes,
    edges,
    execution_plan: ExecutionPlan {
      entry_points,
      exit_points,
      strategy: graph.execution_plan.strategy,
    },
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use gaff_card::{OrchestrationCard, QualityRequirements, SafetyRequirements, UserRequest};
  use gaff_graph::{ExecutionStrategy, OutputDecl};
  use serde_json::json;

  fn node(id: &str) -> Node {
    Node {
      node_id: id.into(),
      agent: "a".into(),
      tool: "t".into(),
      node_type: NodeType::Processing,
      purpose: None,
      instructions: None,
      inputs: HashMap::new(),
      outputs: Vec::<OutputDecl>::new(),
      timeout_ms: None,
      retry_policy: None,
      dependencies: Vec::new(),
      metadata: HashMap::new(),
    }
  }

  fn simple_graph() -> IntentGraph {
    IntentGraph {
      nodes: vec![node("a"), node("b")],
      edges: vec![Edge::new("a", "b")],
      execution_plan: ExecutionPlan {
        entry_points: vec!["a".into()],
        exit_points: vec!["b".into()],
        strategy: ExecutionStrategy::Sequential,
      },
    }
  }

  fn base_card() -> OrchestrationCard {
    OrchestrationCard {
      user_request: UserRequest {
        description: "x".into(),
        domain: None,
        success_criteria: vec![],
      },
      available_agents: vec![],
      constraints: Default::default(),
      preferences: Default::default(),
      quality_requirements: None,
      safety_requirements: None,
    }
  }

  #[test]
  fn disabled_requirements_leave_graph_unchanged() {
    let graph = simple_graph();
    let card = base_card();
    let injected = inject(&graph, &card);
    assert_eq!(injected.nodes.len(), graph.nodes.len());
    assert_eq!(injected.execution_plan.entry_points, graph.execution_plan.entry_points);
  }

  #[test]
  fn quality_auto_validate_appends_validator_after_exits() {
    let graph = simple_graph();
    let mut card = base_card();
    card.quality_requirements = Some(QualityRequirements {
      enabled: true,
      auto_validate: true,
    });
    let injected = inject(&graph, &card);
    assert!(injected.nodes.iter().any(|n| n.node_id == "_quality_validator"));
    assert_eq!(injected.execution_plan.exit_points, vec!["_quality_validator".to_string()]);
    assert!(injected
      .edges
      .iter()
      .any(|e| e.from == "b" && e.to == "_quality_validator"));
  }

  #[test]
  fn safety_prefix_order_is_input_validation_then_compliance() {
    let graph = simple_graph();
    let mut card = base_card();
    card.safety_requirements = Some(SafetyRequirements {
      enabled: true,
      input_validation: Some(json!({"strict": true})),
      compliance_standards: vec!["SOC2".into()],
      output_validation: false,
      audit_logging: false,
    });
    let injected = inject(&graph, &card);
    assert_eq!(
      injected.execution_plan.entry_points,
      vec!["_safety_input_validation".to_string()]
    );
    assert!(injected
      .edges
      .iter()
      .any(|e| e.from == "_safety_input_validation" && e.to == "_safety_compliance_check"));
    assert!(injected
      .edges
      .iter()
      .any(|e| e.from == "_safety_compliance_check" && e.to == "a"));
  }

  #[test]
  fn full_pipeline_and_round_trip_via_strip_injected() {
    let graph = simple_graph();
    let mut card = base_card();
    card.quality_requirements = Some(QualityRequirements {
      enabled: true,
      auto_validate: true,
    });
    card.safety_requirements = Some(SafetyRequirements {
      enabled: true,
      input_validation: Some(json!({})),
      compliance_standards: vec![],
      output_validation: true,
      audit_logging: true,
    });
    let injected = inject(&graph, &card);

    assert_eq!(
      injected.execution_plan.entry_points,
      vec!["_safety_input_validation".to_string()]
    );
    assert_eq!(
      injected.execution_plan.exit_points,
      vec!["_safety_audit_logger".to_string()]
    );
    assert!(injected.nodes.iter().any(|n| n.node_id == "a"));
    assert!(injected.nodes.iter().any(|n| n.node_id == "b"));

    let stripped = strip_injected(&injected);
    let mut stripped_ids: Vec<&str> = stripped.nodes.iter().map(|n| n.node_id.as_str()).collect();
    stripped_ids.sort_unstable();
    assert_eq!(stripped_ids, vec!["a", "b"]);
    assert_eq!(stripped.edges, graph.edges);
  }
}
