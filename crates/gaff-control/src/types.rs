use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use gaff_core::ResultEnvelope;
use gaff_store::{ExecutionState, ExecutionStatus};
use serde::Serialize;

/// What `get_execution_status` returns: a read-only
/// snapshot, never a mutation.
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
  pub execution_id: String,
  pub status: ExecutionStatus,
  pub progress_percentage: u8,
  pub current_node: Option<String>,
  pub completed_nodes: Vec<String>,
  pub failed_nodes: HashSet<String>,
  pub results: HashMap<String, ResultEnvelope>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub paused_at_node: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub pause_reason: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub cancel_reason: Option<String>,
}

impl StatusSnapshot {
  pub fn from_state(state: &ExecutionState) -> Self {
    Self {
      execution_id: state.execution_id.clone(),
      status: state.status,
      progress_percentage: state.progress_percentage(),
      current_node: state.current_node.clone(),
      completed_nodes: state.completed_nodes.clone(),
      failed_nodes: state.failed_nodes.clone(),
      results: state.results.clone(),
      created_at: state.created_at,
      updated_at: state.updated_at,
      paused_at_node: state.paused_at_node.clone(),
      pause_reason: state.pause_reason.clone(),
      cancel_reason: state.cancel_reason.clone(),
    }
  }
}

/// `pause_execution`'s return shape.
#[derive(Debug, Clone, Serialize)]
pub struct PauseAck {
  pub paused: bool,
  pub paused_at_node: Option<String>,
}

/// `resume_execution`'s return shape. The coordinator's own
/// `ExecutionOutcome` carries the richer result; this just confirms the
/// transition took effect.
#[derive(Debug, Clone, Serialize)]
pub struct ResumeAck {
  pub resumed: bool,
}

/// `cancel_execution`'s return shape.
#[derive(Debug, Clone, Serialize)]
pub struct CancelAck {
  pub cancelled: bool,
}
