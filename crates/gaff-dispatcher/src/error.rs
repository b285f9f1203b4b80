use thiserror::Error;

/// Outcome of a single invoker call, before the dispatcher's retry loop
/// decides what to do with it.
#[derive(Debug, Error)]
pub enum InvokeError {
  #[error("transport error invoking {agent}.{tool}: {message}")]
  Transport {
    agent: String,
    tool: String,
    message: String,
  },

  #[error("agent {agent}.{tool} returned an application error: {message}")]
  Application {
    agent: String,
    tool: String,
    message: String,
  },
}

impl InvokeError {
  /// Transport errors are retried by default; an agent's structured
  /// application error is not, unless the caller's retry policy says so.
  pub fn is_retryable(&self) -> bool {
    matches!(self, InvokeError::Transport { .. })
  }
}
