use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use gaff_core::ResultEnvelope;
use gaff_graph::IntentGraph;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The execution's lifecycle state. Terminal once it reaches
/// `Completed`, `Failed` or `Cancelled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
  Running,
  PausedForApproval,
  Completed,
  Failed,
  Cancelled,
}

impl ExecutionStatus {
  pub fn is_terminal(self) -> bool {
    matches!(
      self,
      ExecutionStatus::Completed | ExecutionStatus::Failed | ExecutionStatus::Cancelled
    )
  }
}

/// Durable per-execution record: status, progress, per-node results, and
/// the mutable user context. Owned by the state store; the coordinator
/// holds the sole in-memory working copy during a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionState {
  pub execution_id: String,
  pub status: ExecutionStatus,
  pub graph: IntentGraph,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub current_node: Option<String>,
  #[serde(default)]
  pub completed_nodes: Vec<String>,
  #[serde(default)]
  pub failed_nodes: HashSet<String>,
  #[serde(default)]
  pub results: HashMap<String, ResultEnvelope>,
  #[serde(default)]
  pub context: HashMap<String, Value>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub paused_at: Option<DateTime<Utc>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub paused_at_node: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub pause_reason: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub cancelled_at: Option<DateTime<Utc>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub cancel_reason: Option<String>,
}

impl ExecutionState {
  pub fn new(execution_id: impl Into<String>, graph: IntentGraph, context: HashMap<String, Value>) -> Self {
    let now = Utc::now();
    Self {
      execution_id: execution_id.into(),
      status: ExecutionStatus::Running,
      graph,
      current_node: None,
      completed_nodes: Vec::new(),
      failed_nodes: HashSet::new(),
      results: HashMap::new(),
      context,
      created_at: now,
      updated_at: now,
      paused_at: None,
      paused_at_node: None,
      pause_reason: None,
      cancelled_at: None,
      cancel_reason: None,
    }
  }

  pub fn total_nodes(&self) -> usize {
    self.graph.nodes.len()
  }

  /// `completed_nodes.len() / total_nodes` as a 0-100 percentage, rounded
  /// down, used by the control API's status snapshot.
  pub fn progress_percentage(&self) -> u8 {
    let total = self.total_nodes();
    if total == 0 {
      return 100;
    }
    ((self.completed_nodes.len() * 100) / total) as u8
  }

  pub fn touch(&mut self) {
    self.updated_at = Utc::now();
  }
}
