use serde::{Deserialize, Serialize};

/// Stable error classification shared by the dispatcher, coordinator and
/// control API so callers can branch on `error.kind` without depending on
/// any one crate's concrete error enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
  GraphInvalid,
  NodeTimeout,
  NodeTransport,
  NodeApplication,
  PersistenceFailure,
  HitlPause,
  InvalidTransition,
  ConfigError,
}

impl ErrorKind {
  /// Whether a dispatcher should retry a node invocation that failed with this kind.
  pub fn is_retryable(self) -> bool {
    matches!(self, ErrorKind::NodeTimeout | ErrorKind::NodeTransport)
  }
}

#[derive(Debug, thiserror::Error)]
pub enum GaffError {
  #[error("graph invalid: {message}")]
  GraphInvalid { message: String },

  #[error("node {node_id} timed out after {timeout_ms}ms")]
  NodeTimeout { node_id: String, timeout_ms: u64 },

  #[error("node {node_id} transport error: {message}")]
  NodeTransport { node_id: String, message: String },

  #[error("node {node_id} application error: {message}")]
  NodeApplication { node_id: String, message: String },

  #[error("persistence failure: {message}")]
  PersistenceFailure { message: String },

  #[error("execution {execution_id} paused for approval at node {node_id}")]
  HitlPause {
    execution_id: String,
    node_id: String,
  },

  #[error("invalid transition: {message}")]
  InvalidTransition { message: String },

  #[error("config error: {message}")]
  ConfigError { message: String },
}

impl GaffError {
  pub fn kind(&self) -> ErrorKind {
    match self {
      GaffError::GraphInvalid { .. } => ErrorKind::GraphInvalid,
      GaffError::NodeTimeout { .. } => ErrorKind::NodeTimeout,
      GaffError::NodeTransport { .. } => ErrorKind::NodeTransport,
      GaffError::NodeApplication { .. } => ErrorKind::NodeApplication,
      GaffError::PersistenceFailure { .. } => ErrorKind::PersistenceFailure,
      GaffError::HitlPause { .. } => ErrorKind::HitlPause,
      GaffError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
      GaffError::ConfigError { .. } => ErrorKind::ConfigError,
    }
  }
}
