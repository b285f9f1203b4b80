//! End-to-end tests driving `Coordinator` the way an external caller
//! would: build a graph and an agent catalog, then execute through the
//! public API with in-process mocks only.

use std::collections::HashMap;
use std::sync::Arc;

use gaff_agent_registry::{Agent, AgentCatalog, AuthMode};
use gaff_coordinator::{ApprovalDecision, Coordinator, CoordinatorConfig, ExecutionOutcome};
use gaff_dispatcher::MockInvoker;
use gaff_graph::{Edge, ExecutionPlan, ExecutionStrategy, IntentGraph, Node, NodeType, OutputDecl, RetryPolicy};
use gaff_injector::inject;
use gaff_card::OrchestrationCard;
use gaff_store::{ExecutionStatus, InMemoryStore};
use serde_json::json;

fn agent(name: &str) -> Agent {
  Agent {
    name: name.into(),
    agent_type: "mock".into(),
    description: String::new(),
    capabilities: vec![],
    endpoint: None,
    auth: AuthMode::None,
    timeout_ms: None,
    retry_policy: RetryPolicy::default(),
    input_schema: json!({}),
    output_schema: json!({}),
  }
}

fn node(id: &str, agent_name: &str) -> Node {
  Node {
    node_id: id.into(),
    agent: agent_name.into(),
    tool: "call".into(),
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

fn plan(entries: &[&str], exits: &[&str]) -> ExecutionPlan {
  ExecutionPlan {
    entry_points: entries.iter().map(|s| s.to_string()).collect(),
    exit_points: exits.iter().map(|s| s.to_string()).collect(),
    strategy: ExecutionStrategy::Hybrid,
  }
}

#[tokio::test]
async fn injected_quality_and_safety_nodes_execute_alongside_the_original_graph() {
  let a = node("a", "svc");
  let b = node("b", "svc");
  let base_graph = IntentGraph {
    nodes: vec![a, b],
    edges: vec![Edge::new("a", "b")],
    execution_plan: plan(&["a"], &["b"]),
  };

  let card: OrchestrationCard = serde_json::from_value(json!({
    "user_request": {"description": "demo"},
    "available_agents": [],
    "quality_requirements": {"enabled": true, "auto_validate": true},
    "safety_requirements": {
      "enabled": true,
      "input_validation": {},
      "output_validation": true,
      "audit_logging": true
    }
  }))
  .unwrap();

  let graph = inject(&base_graph, &card);
  assert!(graph.nodes.len() > base_graph.nodes.len());

  let invoker = MockInvoker::new()
    .on("svc", "call", |_| Ok(json!({"ok": true})))
    .on("gaff-tools", "safety_input_validation", |_| Ok(json!({"ok": true})))
    .on("gaff-tools", "quality_validator", |_| Ok(json!({"ok": true})))
    .on("gaff-tools", "safety_output_validation", |_| Ok(json!({"ok": true})))
    .on("gaff-tools", "safety_audit_logger", |_| Ok(json!({"ok": true})));
  let registry = AgentCatalog::new(vec![agent("svc"), agent("gaff-tools")]).unwrap();
  let store = InMemoryStore::new();
  let coordinator = Coordinator::new(Arc::new(registry), Arc::new(invoker), Arc::new(store));

  let outcome = coordinator
    .execute(graph, HashMap::new(), CoordinatorConfig::default())
    .await
    .unwrap();

  match outcome {
    ExecutionOutcome::Settled(settled) => {
      assert_eq!(settled.status, ExecutionStatus::Completed);
      assert_eq!(settled.nodes_executed, 6);
    }
    other => panic!("expected settled outcome, got {other:?}"),
  }
}

#[tokio::test]
async fn rejected_approval_fails_the_execution_without_running_downstream_nodes() {
  let a = node("a", "svc");
  let mut h = node("h", gaff_graph::HITL_AGENT);
  h.tool = gaff_graph::HITL_TOOL.to_string();
  let b = node("b", "svc");

  let graph = IntentGraph {
    nodes: vec![a, h, b],
    edges: vec![Edge::new("a", "h"), Edge::new("h", "b")],
    execution_plan: plan(&["a"], &["b"]),
  };

  let invoker = MockInvoker::new().on("svc", "call", |_| Ok(json!({"ok": true})));
  let registry = AgentCatalog::new(vec![agent("svc"), agent(gaff_graph::HITL_AGENT)]).unwrap();
  let store = InMemoryStore::new();
  let coordinator = Coordinator::new(Arc::new(registry), Arc::new(invoker), Arc::new(store));

  let paused = coordinator
    .execute(graph, HashMap::new(), CoordinatorConfig::default())
    .await
    .unwrap();
  let execution_id = paused.execution_id().to_string();

  let decision = ApprovalDecision {
    approved: false,
    modified_context: None,
  };
  let resumed = coordinator
    .resume(&execution_id, Some(decision), CoordinatorConfig::default())
    .await
    .unwrap();

  match resumed {
    ExecutionOutcome::Settled(settled) => {
      assert_eq!(settled.status, ExecutionStatus::Failed);
      assert!(!settled.results.contains_key("b"));
    }
    other => panic!("expected settled outcome, got {other:?}"),
  }
}
