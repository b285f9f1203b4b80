use std::time::Instant;

use gaff_agent_registry::Agent;
use gaff_core::{ErrorKind, ResultEnvelope};
use gaff_graph::{Node, RetryPolicy};
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::backoff::delay_for;
use crate::error::InvokeError;
use crate::invoker::AgentInvoker;

/// Invoke a single node against its backing agent with timeout, retry and
/// backoff, producing a uniform `ResultEnvelope`. HITL nodes are
/// never passed here — the coordinator short-circuits them before dispatch.
#[instrument(
  name = "dispatch",
  skip(invoker, agent, node, resolved_input),
  fields(agent = %agent.name, tool = %node.tool, node_id = %node.node_id)
)]
pub async fn dispatch(
  invoker: &dyn AgentInvoker,
  agent: &Agent,
  node: &Node,
  resolved_input: Value,
  global_timeout_ms: u64,
) -> ResultEnvelope {
  let retry_policy = effective_retry_policy(node, agent);
  let timeout_ms = node
    .timeout_ms
    .or(agent.timeout_ms)
    .unwrap_or(global_timeout_ms);
  let timeout = std::time::Duration::from_millis(timeout_ms);

  let started = Instant::now();
  let mut attempt = 0u32;

  loop {
    attempt += 1;
    let call = invoker.invoke(agent, &node.tool, resolved_input.clone());

    let outcome: Result<Value, (ErrorKind, String)> = match tokio::time::timeout(timeout, call).await
    {
      Ok(Ok(value)) => Ok(value),
      Ok(Err(invoke_err)) => Err(classify(invoke_err)),
      Err(_elapsed) => Err((
        ErrorKind::NodeTimeout,
        format!("node {} timed out after {timeout_ms}ms", node.node_id),
      )),
    };

    match outcome {
      Ok(value) => {
        let duration_ms = started.elapsed().as_millis() as u64;
        info!(attempt, duration_ms, "node dispatch succeeded");
        return ResultEnvelope::success(value, attempt, duration_ms);
      }
      Err((kind, message)) => {
        let retryable = kind.is_retryable();
        let exhausted = attempt >= retry_policy.max_attempts;
        warn!(attempt, kind = kind_label(kind), retryable, exhausted, "node dispatch failed");

        if retryable && !exhausted {
          tokio::time::sleep(delay_for(retry_policy.backoff, attempt)).await;
          continue;
        }

        let duration_ms = started.elapsed().as_millis() as u64;
        return ResultEnvelope::failure(message, kind, attempt, duration_ms);
      }
    }
  }
}

fn effective_retry_policy(node: &Node, agent: &Agent) -> RetryPolicy {
  node
    .retry_policy
    .clone()
    .unwrap_or_else(|| agent.retry_policy.clone())
}

fn classify(err: InvokeError) -> (ErrorKind, String) {
  let retryable = err.is_retryable();
  let message = err.to_string();
  let kind = if retryable {
    ErrorKind::NodeTransport
  } else {
    ErrorKind::NodeApplication
  };
  (kind, message)
}

fn kind_label(kind: ErrorKind) -> &'static str {
  match kind {
    ErrorKind::GraphInvalid => "graph_invalid",
    ErrorKind::NodeTimeout => "node_timeout",
    ErrorKind::NodeTransport => "node_transport",
    ErrorKind::NodeApplication => "node_application",
    ErrorKind::PersistenceFailure => "persistence_failure",
    ErrorKind::HitlPause => "hitl_pause",
    ErrorKind::InvalidTransition => "invalid_transition",
    ErrorKind::ConfigError => "config_error",
  }
}
