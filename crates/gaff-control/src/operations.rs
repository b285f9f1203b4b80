use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use gaff_agent_registry::AgentRegistry;
use gaff_coordinator::{ApprovalDecision, Coordinator, CoordinatorConfig, ExecutionOutcome};
use gaff_core::ResultEnvelope;
use gaff_dispatcher::AgentInvoker;
use gaff_graph::{IntentGraph, Node, NodeType, OutputDecl, RetryPolicy};
use gaff_store::{ExecutionStatus, StateStore};
use serde_json::Value;
use tracing::{info, instrument};

use crate::error::ControlError;
use crate::types::{CancelAck, PauseAck, ResumeAck, StatusSnapshot};

/// The external control surface over a running coordinator: execute, status,
/// pause, resume, cancel, and an ad-hoc `route_to_agent` escape hatch.
/// Holds no execution state of its own — every operation reads
/// the store fresh and writes back through it, so multiple `ControlApi`
/// handles (e.g. one per inbound request) stay consistent.
pub struct ControlApi {
  coordinator: Arc<Coordinator>,
  store: Arc<dyn StateStore>,
  registry: Arc<dyn AgentRegistry>,
  invoker: Arc<dyn AgentInvoker>,
}

impl ControlApi {
  pub fn new(
    coordinator: Arc<Coordinator>,
    store: Arc<dyn StateStore>,
    registry: Arc<dyn AgentRegistry>,
    invoker: Arc<dyn AgentInvoker>,
  ) -> Self {
    Self {
      coordinator,
      store,
      registry,
      invoker,
    }
  }

  /// Validate, schedule and run `graph` from scratch (`execute_graph`). A
  /// caller holding only a `graph_memory_key` is
  /// expected to resolve it against the memory-store client into a graph
  /// before calling this operation — `gaff-control` talks to the execution
  /// state store, not the generic key-addressable entity store the card
  /// builder persists cards under.
  #[instrument(name = "execute_graph", skip(self, graph, context, config))]
  pub async fn execute_graph(
    &self,
    graph: IntentGraph,
    context: HashMap<String, Value>,
    config: CoordinatorConfig,
  ) -> Result<ExecutionOutcome, ControlError> {
    self
      .coordinator
      .execute(graph, context, config)
      .await
      .map_err(|source| ControlError::Coordinator {
        execution_id: source.execution_id().to_string(),
        source,
      })
  }

  /// Invoke a single named agent outside of any graph (`route_to_agent`):
  /// no node id, no result persisted, just the
  /// dispatcher's timeout/retry/backoff wrapped as a `ResultEnvelope`. An
  /// explicit `retry_config` overrides whatever policy the catalog agent
  /// carries; `timeout_ms` overrides the agent's own timeout.
  #[instrument(name = "route_to_agent", skip(self, input, retry_config))]
  pub async fn route_to_agent(
    &self,
    agent_name: &str,
    tool_name: &str,
    input: Value,
    timeout_ms: Option<u64>,
    retry_config: Option<RetryPolicy>,
  ) -> Result<ResultEnvelope, ControlError> {
    let agent = self
      .registry
      .get(agent_name)
      .await
      .map_err(|source| ControlError::Registry {
        agent_name: agent_name.to_string(),
        source,
      })?;

    let node = Node {
      node_id: format!("route:{agent_name}:{tool_name}"),
      agent: agent_name.to_string(),
      tool: tool_name.to_string(),
      node_type: NodeType::Processing,
      purpose: None,
      instructions: None,
      inputs: HashMap::new(),
      outputs: Vec::<OutputDecl>::new(),
      timeout_ms,
      retry_policy: retry_config,
      dependencies: Vec::new(),
      metadata: HashMap::new(),
    };

    let global_timeout = timeout_ms.or(agent.timeout_ms).unwrap_or(300_000);
    let envelope = gaff_dispatcher::dispatch(self.invoker.as_ref(), &agent, &node, input, global_timeout).await;
    if !envelope.success {
      info!(agent_name, tool_name, kind = ?envelope.error.as_ref().map(|e| e.kind), "route_to_agent_failed");
    }
    Ok(envelope)
  }

  /// Read-only snapshot; never mutates state.
  #[instrument(name = "get_execution_status", skip(self))]
  pub async fn get_execution_status(&self, execution_id: &str) -> Result<StatusSnapshot, ControlError> {
    let state = self.load(execution_id).await?;
    Ok(StatusSnapshot::from_state(&state))
  }

  /// Permitted only from `running`. Does not interrupt an in-flight node —
  /// the coordinator's own batch-boundary check is what actually stops
  /// dispatch.
  #[instrument(name = "pause_execution", skip(self, reason))]
  pub async fn pause_execution(&self, execution_id: &str, reason: Option<String>) -> Result<PauseAck, ControlError> {
    let mut state = self.load(execution_id).await?;
    if state.status != ExecutionStatus::Running {
      return Err(ControlError::InvalidTransition {
        execution_id: execution_id.to_string(),
        operation: "pause",
        status: format!("{:?}", state.status),
      });
    }

    state.status = ExecutionStatus::PausedForApproval;
    state.paused_at = Some(Utc::now());
    state.pause_reason = reason;
    state.touch();
    self.persist(&state).await?;

    info!(execution_id, paused_at_node = ?state.paused_at_node, "execution_paused_externally");
    Ok(PauseAck {
      paused: true,
      paused_at_node: state.paused_at_node,
    })
  }

  /// Permitted only from `paused_for_approval`. Merges
  /// `approval_decision.modified_context` and re-invokes the coordinator
  /// from the first node of the batch that contained the paused node.
  #[instrument(name = "resume_execution", skip(self, approval_decision, config))]
  pub async fn resume_execution(
    &self,
    execution_id: &str,
    approval_decision: Option<ApprovalDecision>,
    config: CoordinatorConfig,
  ) -> Result<(ResumeAck, ExecutionOutcome), ControlError> {
    let state = self.load(execution_id).await?;
    if state.status != ExecutionStatus::PausedForApproval {
      return Err(ControlError::InvalidTransition {
        execution_id: execution_id.to_string(),
        operation: "resume",
        status: format!("{:?}", state.status),
      });
    }

    let outcome = self
      .coordinator
      .resume(execution_id, approval_decision, config)
      .await
      .map_err(|source| ControlError::Coordinator {
        execution_id: execution_id.to_string(),
        source,
      })?;

    info!(execution_id, status = ?outcome.status(), "execution_resumed_externally");
    Ok((ResumeAck { resumed: true }, outcome))
  }

  /// Permitted from any non-terminal state. In-flight nodes are allowed to
  /// complete and record their results; the coordinator checks for
  /// cancellation at the next batch boundary and stops dispatching further
  /// nodes rather than aborting mid-flight work.
  /// Signals the in-process `CancellationToken` too, so a coordinator
  /// sharing this store takes effect without waiting on its own next store
  /// read; a cancel issued against a different process still lands, since
  /// the persisted status above is what that coordinator's poll falls back to.
  #[instrument(name = "cancel_execution", skip(self, reason))]
  pub async fn cancel_execution(&self, execution_id: &str, reason: Option<String>) -> Result<CancelAck, ControlError> {
    let mut state = self.load(execution_id).await?;
    if state.status.is_terminal() {
      return Err(ControlError::InvalidTransition {
        execution_id: execution_id.to_string(),
        operation: "cancel",
        status: format!("{:?}", state.status),
      });
    }

    state.status = ExecutionStatus::Cancelled;
    state.cancelled_at = Some(Utc::now());
    state.cancel_reason = reason;
    state.touch();
    self.persist(&state).await?;
    self.coordinator.request_cancel(execution_id).await;

    info!(execution_id, "execution_cancelled_externally");
    Ok(CancelAck { cancelled: true })
  }

  async fn load(&self, execution_id: &str) -> Result<gaff_store::ExecutionState, ControlError> {
    self
      .store
      .get(execution_id)
      .await
      .map_err(|source| ControlError::Store {
        execution_id: execution_id.to_string(),
        source,
      })?
      .ok_or_else(|| ControlError::NotFound {
        execution_id: execution_id.to_string(),
      })
  }

  async fn persist(&self, state: &gaff_store::ExecutionState) -> Result<(), ControlError> {
    self.store.put(state).await.map_err(|source| ControlError::Store {
      execution_id: state.execution_id.clone(),
      source,
    })
  }
}
