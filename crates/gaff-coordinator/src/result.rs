use std::collections::HashMap;

use gaff_core::ResultEnvelope;
use gaff_store::ExecutionStatus;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What a caller approves or rejects when resuming a paused execution
/// surfaced by `resume_execution`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApprovalDecision {
  #[serde(default)]
  pub approved: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub modified_context: Option<HashMap<String, Value>>,
}

/// What `execute`/`resume` hand back to the caller: either the run settled
/// (completed, failed, or cancelled) or it paused at a HITL gate.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ExecutionOutcome {
  Paused(PausedExecution),
  Settled(SettledExecution),
}

impl ExecutionOutcome {
  pub fn execution_id(&self) -> &str {
    match self {
      ExecutionOutcome::Paused(p) => &p.execution_id,
      ExecutionOutcome::Settled(s) => &s.execution_id,
    }
  }

  pub fn status(&self) -> ExecutionStatus {
    match self {
      ExecutionOutcome::Paused(p) => p.status,
      ExecutionOutcome::Settled(s) => s.status,
    }
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct PausedExecution {
  pub execution_id: String,
  pub status: ExecutionStatus,
  pub paused_at_node: String,
  pub waiting_for_approval: bool,
  pub partial_results: HashMap<String, ResultEnvelope>,
  pub resume_instructions: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SettledExecution {
  pub execution_id: String,
  pub status: ExecutionStatus,
  pub results: HashMap<String, ResultEnvelope>,
  pub execution_time_ms: u64,
  pub nodes_executed: usize,
  pub nodes_failed: usize,
  pub context: HashMap<String, Value>,
}
