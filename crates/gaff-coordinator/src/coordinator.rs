use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use gaff_agent_registry::{Agent, AgentRegistry};
use gaff_core::{ErrorKind, ResultEnvelope};
use gaff_dispatcher::AgentInvoker;
use gaff_graph::{IntentGraph, Node, RetryPolicy};
use gaff_store::{ExecutionState, ExecutionStatus, StateStore};
use serde_json::Value;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::config::CoordinatorConfig;
use crate::error::CoordinatorError;
use crate::result::{ApprovalDecision, ExecutionOutcome, PausedExecution, SettledExecution};

/// Drives a validated intent graph to completion: topological batching,
/// bounded-parallel dispatch, HITL suspension, and durable state writes.
/// Owns the in-memory working copy of exactly one execution at
/// a time; the state store holds the durable copy other components read.
pub struct Coordinator {
  registry: Arc<dyn AgentRegistry>,
  invoker: Arc<dyn AgentInvoker>,
  store: Arc<dyn StateStore>,
  tokens: RwLock<HashMap<String, CancellationToken>>,
}

impl Coordinator {
  pub fn new(
    registry: Arc<dyn AgentRegistry>,
    invoker: Arc<dyn AgentInvoker>,
    store: Arc<dyn StateStore>,
  ) -> Self {
    Self {
      registry,
      invoker,
      store,
      tokens: RwLock::new(HashMap::new()),
    }
  }

  /// Request cooperative cancellation for an in-process execution. Takes
  /// effect at the next batch boundary; nodes already dispatched are left
  /// to complete. A caller cancelling an execution owned by
  /// a different coordinator instance (e.g. a separate process) should
  /// write `ExecutionStatus::Cancelled` to the shared store instead — `run`
  /// checks both.
  pub async fn request_cancel(&self, execution_id: &str) {
    if let Some(token) = self.tokens.read().await.get(execution_id) {
      token.cancel();
    }
  }

  /// Validate, schedule and run `graph` from scratch under a freshly
  /// generated execution id.
  #[instrument(name = "execute", skip(self, graph, context, config), fields(execution_id))]
  pub async fn execute(
    &self,
    graph: IntentGraph,
    context: HashMap<String, Value>,
    config: CoordinatorConfig,
  ) -> Result<ExecutionOutcome, CoordinatorError> {
    let execution_id = Uuid::new_v4().to_string();
    tracing::Span::current().record("execution_id", execution_id.as_str());
    let started = Instant::now();
    info!(execution_id = %execution_id, "execution_started");

    if let Err(source) = gaff_graph::validate(&graph) {
      let mut state = ExecutionState::new(execution_id.clone(), graph, context);
      state.status = ExecutionStatus::Failed;
      self.persist(&mut state).await;
      error!(execution_id = %execution_id, error = %source, "execution_rejected");
      return Err(CoordinatorError::GraphInvalid { execution_id, source });
    }

    let mut state = ExecutionState::new(execution_id.clone(), graph, context);
    self.persist(&mut state).await;
    self.tokens.write().await.insert(execution_id.clone(), CancellationToken::new());

    let outcome = self.run(&mut state, &config, 0, started).await;
    self.log_outcome(&execution_id, &outcome);
    self.tokens.write().await.remove(&execution_id);
    outcome
  }

  /// Resume an execution paused at a HITL gate. Restarts
  /// dispatch from the first node of the batch that contained the paused
  /// node; every node already in `completed_nodes`/`failed_nodes` — the
  /// paused node included, once this call synthesizes its result — is
  /// reused rather than re-dispatched.
  #[instrument(name = "resume", skip(self, approval_decision, config), fields(execution_id = %execution_id))]
  pub async fn resume(
    &self,
    execution_id: &str,
    approval_decision: Option<ApprovalDecision>,
    config: CoordinatorConfig,
  ) -> Result<ExecutionOutcome, CoordinatorError> {
    let started = Instant::now();
    let mut state = self
      .store
      .get(execution_id)
      .await
      .ok()
      .flatten()
      .ok_or_else(|| CoordinatorError::NotFound {
        execution_id: execution_id.to_string(),
      })?;

    if state.status != ExecutionStatus::PausedForApproval {
      return Err(CoordinatorError::InvalidTransition {
        execution_id: execution_id.to_string(),
        message: format!("cannot resume execution in status {:?}", state.status),
      });
    }

    let paused_node = state.paused_at_node.clone().ok_or_else(|| CoordinatorError::InvalidTransition {
      execution_id: execution_id.to_string(),
      message: "paused execution carries no paused_at_node".to_string(),
    })?;

    if let Some(modified) = approval_decision.as_ref().and_then(|d| d.modified_context.as_ref()) {
      for (key, value) in modified {
        state.context.insert(key.clone(), value.clone());
      }
    }

    let approved = approval_decision.map(|d| d.approved).unwrap_or(true);
    if approved {
      state.results.insert(
        paused_node.clone(),
        ResultEnvelope::success(
          serde_json::json!({"approved": true, "node_id": paused_node}),
          1,
          0,
        ),
      );
      state.completed_nodes.push(paused_node.clone());
    } else {
      state.results.insert(
        paused_node.clone(),
        ResultEnvelope::failure("rejected by approver", ErrorKind::NodeApplication, 1, 0),
      );
      state.failed_nodes.insert(paused_node.clone());
    }

    state.status = ExecutionStatus::Running;
    state.paused_at = None;
    state.paused_at_node = None;
    state.pause_reason = None;
    self.persist(&mut state).await;

    if !approved {
      state.status = ExecutionStatus::Failed;
      self.persist(&mut state).await;
      let outcome = Ok(self.settle(&state, started));
      self.log_outcome(execution_id, &outcome);
      return outcome;
    }

    let graph = state.graph.clone();
    let batches = schedule(&graph, execution_id).map_err(|e| e)?;
    let start_batch = batches
      .iter()
      .position(|layer| layer.iter().any(|id| id == &paused_node))
      .unwrap_or(0);

    self
      .tokens
      .write()
      .await
      .entry(execution_id.to_string())
      .or_insert_with(CancellationToken::new);

    let outcome = self.run(&mut state, &config, start_batch, started).await;
    self.log_outcome(execution_id, &outcome);
    self.tokens.write().await.remove(execution_id);
    outcome
  }

  fn log_outcome(&self, execution_id: &str, outcome: &Result<ExecutionOutcome, CoordinatorError>) {
    match outcome {
      Ok(ExecutionOutcome::Settled(settled)) => {
        info!(execution_id = %execution_id, status = ?settled.status, nodes_executed = settled.nodes_executed, nodes_failed = settled.nodes_failed, "execution_settled")
      }
      Ok(ExecutionOutcome::Paused(paused)) => {
        info!(execution_id = %execution_id, paused_at_node = %paused.paused_at_node, "execution_paused")
      }
      Err(source) => error!(execution_id = %execution_id, error = %source, "execution_errored"),
    }
  }

  /// The batch-barrier loop shared by `execute` and `resume`: run
  /// `batches[start_batch..]` in order, skipping any node already settled
  /// (reused results), dispatching the rest in waves of at most
  /// `config.max_parallel`, and suspending the instant a HITL node is next
  /// in line.
  async fn run(
    &self,
    state: &mut ExecutionState,
    config: &CoordinatorConfig,
    start_batch: usize,
    started: Instant,
  ) -> Result<ExecutionOutcome, CoordinatorError> {
    let graph = state.graph.clone();
    let batches = schedule(&graph, &state.execution_id)?;
    let index = graph.index().map_err(|source| CoordinatorError::GraphInvalid {
      execution_id: state.execution_id.clone(),
      source,
    })?;
    let max_parallel = config.max_parallel.max(1);

    for layer in &batches[start_batch.min(batches.len())..] {
      if self.is_cancelled(&state.execution_id).await {
        state.status = ExecutionStatus::Cancelled;
        state.cancelled_at = Some(Utc::now());
        self.persist(state).await;
        return Ok(self.settle(state, started));
      }
      if started.elapsed().as_millis() as u64 > config.timeout_ms {
        warn!(execution_id = %state.execution_id, "execution_timed_out");
        state.status = ExecutionStatus::Failed;
        self.persist(state).await;
        return Ok(self.settle(state, started));
      }

      for wave in layer.chunks(max_parallel) {
        let mut to_dispatch: Vec<&Node> = Vec::new();
        let mut hitl_hit: Option<String> = None;

        for node_id in wave {
          if node_already_settled(state, node_id) {
            continue;
          }
          let node = index.nodes.get(node_id.as_str()).copied().expect("node indexed by scheduler");
          if node.is_hitl() && config.enable_hitl {
            hitl_hit = Some(node_id.clone());
            break;
          }
          to_dispatch.push(node);
        }

        if !to_dispatch.is_empty() {
          state.current_node = to_dispatch.last().map(|n| n.node_id.clone());
          self.persist(state).await;
          self.dispatch_wave(state, &to_dispatch, config).await;
          self.persist(state).await;
        }

        if let Some(node_id) = hitl_hit {
          state.status = ExecutionStatus::PausedForApproval;
          state.paused_at = Some(Utc::now());
          state.paused_at_node = Some(node_id.clone());
          self.persist(state).await;
          return Ok(ExecutionOutcome::Paused(PausedExecution {
            execution_id: state.execution_id.clone(),
            status: ExecutionStatus::PausedForApproval,
            paused_at_node: node_id,
            waiting_for_approval: true,
            partial_results: state.results.clone(),
            resume_instructions: "call resume with an approval_decision to continue from this node".to_string(),
          }));
        }
      }
    }

    state.status = if state.failed_nodes.is_empty() {
      ExecutionStatus::Completed
    } else {
      ExecutionStatus::Failed
    };
    self.persist(state).await;
    Ok(self.settle(state, started))
  }

  /// Resolve inputs and dispatch every node in `wave` concurrently, then
  /// fold the settled results back into `state`, honoring the configured
  /// parallelism bound.
  async fn dispatch_wave(&self, state: &mut ExecutionState, wave: &[&Node], config: &CoordinatorConfig) {
    let results_snapshot = result_values(&state.results, &state.completed_nodes);
    let context_snapshot = state.context.clone();

    let mut handles = Vec::with_capacity(wave.len());
    for node in wave {
      let node = (*node).clone();
      let resolved = gaff_resolver::resolve(&node.inputs, &results_snapshot, &context_snapshot);
      let registry = self.registry.clone();
      let invoker = self.invoker.clone();
      let timeout_ms = config.timeout_ms;
      let max_retries = config.max_retries;

      handles.push(tokio::spawn(async move {
        let node_id = node.node_id.clone();
        let envelope = match registry.get(&node.agent).await {
          Ok(agent) => {
            let node = apply_retry_ceiling(node, &agent, max_retries);
            let input = Value::Object(resolved.into_iter().collect());
            gaff_dispatcher::dispatch(invoker.as_ref(), &agent, &node, input, timeout_ms).await
          }
          Err(source) => ResultEnvelope::failure(
            format!("agent '{}' not found: {source}", node.agent),
            ErrorKind::ConfigError,
            0,
            0,
          ),
        };
        (node_id, envelope)
      }));
    }

    let joined = futures::future::join_all(handles).await;
    for (node, outcome) in wave.iter().zip(joined.into_iter()) {
      let (node_id, envelope) = match outcome {
        Ok(pair) => pair,
        Err(join_error) => (
          node.node_id.clone(),
          ResultEnvelope::failure(format!("node task panicked: {join_error}"), ErrorKind::NodeTransport, 0, 0),
        ),
      };

      if envelope.success {
        state.completed_nodes.push(node_id.clone());
      } else {
        state.failed_nodes.insert(node_id.clone());
      }
      if let Err(source) = self.store.put_node_result(&state.execution_id, &node_id, &envelope).await {
        warn!(execution_id = %state.execution_id, node_id = %node_id, error = %source, "failed to persist node result");
      }
      state.results.insert(node_id, envelope);
    }
  }

  /// Checks the in-process token first (set by `request_cancel`, visible
  /// without a store round-trip) and falls back to the persisted status so
  /// an out-of-process caller writing `ExecutionStatus::Cancelled` directly
  /// to the store (as `gaff-control::cancel_execution` does) is honored
  /// too.
  async fn is_cancelled(&self, execution_id: &str) -> bool {
    let token_cancelled = self
      .tokens
      .read()
      .await
      .get(execution_id)
      .map(|t| t.is_cancelled())
      .unwrap_or(false);
    if token_cancelled {
      return true;
    }
    matches!(
      self.store.get(execution_id).await,
      Ok(Some(persisted)) if persisted.status == ExecutionStatus::Cancelled
    )
  }

  async fn persist(&self, state: &mut ExecutionState) {
    state.touch();
    if let Err(source) = self.store.put(state).await {
      warn!(execution_id = %state.execution_id, error = %source, "failed to persist execution state");
    }
  }

  fn settle(&self, state: &ExecutionState, started: Instant) -> ExecutionOutcome {
    ExecutionOutcome::Settled(SettledExecution {
      execution_id: state.execution_id.clone(),
      status: state.status,
      results: state.results.clone(),
      execution_time_ms: started.elapsed().as_millis() as u64,
      nodes_executed: state.completed_nodes.len(),
      nodes_failed: state.failed_nodes.len(),
      context: state.context.clone(),
    })
  }
}

fn node_already_settled(state: &ExecutionState, node_id: &str) -> bool {
  state.completed_nodes.iter().any(|id| id == node_id) || state.failed_nodes.contains(node_id)
}

fn schedule(graph: &IntentGraph, execution_id: &str) -> Result<Vec<Vec<String>>, CoordinatorError> {
  let sorted = gaff_scheduler::sort(graph).map_err(|source| CoordinatorError::Schedule {
    execution_id: execution_id.to_string(),
    source,
  })?;
  gaff_scheduler::batch(graph, &sorted).map_err(|source| CoordinatorError::Schedule {
    execution_id: execution_id.to_string(),
    source,
  })
}

/// A node's already-resolved output, keyed by node id, for the resolver's
/// `results[a].result` lookup. Only nodes in `completed_nodes` are
/// included — a failed node's id is omitted entirely rather than mapped to
/// `null`, so `lookup()` falls through to "unresolved" and a bare `${a}`
/// reference to a failed node stays the literal string instead of
/// resolving to `null`.
fn result_values(results: &HashMap<String, ResultEnvelope>, completed_nodes: &[String]) -> HashMap<String, Value> {
  completed_nodes
    .iter()
    .filter_map(|id| results.get(id).map(|envelope| (id.clone(), envelope.result.clone().unwrap_or(Value::Null))))
    .collect()
}

/// Coordinator-level ceiling on retry attempts (`config.max_retries`,
/// default 3): bounds whichever of the node's own retry policy or its
/// agent's default would otherwise apply, without overriding a policy that
/// already asks for fewer attempts.
fn apply_retry_ceiling(mut node: Node, agent: &Agent, ceiling: u32) -> Node {
  let base = node.retry_policy.clone().unwrap_or_else(|| agent.retry_policy.clone());
  let max_attempts = base.max_attempts.min(ceiling.max(1));
  node.retry_policy = Some(RetryPolicy {
    max_attempts,
    backoff: base.backoff,
  });
  node
}
