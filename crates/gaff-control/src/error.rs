use gaff_core::ErrorKind;
use thiserror::Error;

/// Failures raised by the control operations themselves, as distinct from
/// per-node failures carried inside a `ResultEnvelope`.
#[derive(Debug, Error)]
pub enum ControlError {
  #[error("execution {execution_id} not found")]
  NotFound { execution_id: String },

  #[error("cannot {operation} execution {execution_id} in status {status}")]
  InvalidTransition {
    execution_id: String,
    operation: &'static str,
    status: String,
  },

  #[error("state store error for execution {execution_id}: {source}")]
  Store {
    execution_id: String,
    #[source]
    source: gaff_store::StoreError,
  },

  #[error("coordinator rejected resume of execution {execution_id}: {source}")]
  Coordinator {
    execution_id: String,
    #[source]
    source: gaff_coordinator::CoordinatorError,
  },

  #[error("agent registry lookup failed for '{agent_name}': {source}")]
  Registry {
    agent_name: String,
    #[source]
    source: gaff_agent_registry::RegistryError,
  },
}

impl ControlError {
  pub fn kind(&self) -> ErrorKind {
    match self {
      ControlError::NotFound { .. } => ErrorKind::PersistenceFailure,
      ControlError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
      ControlError::Store { .. } => ErrorKind::PersistenceFailure,
      ControlError::Coordinator { source, .. } => source.kind(),
      ControlError::Registry { .. } => ErrorKind::ConfigError,
    }
  }

  /// `None` for `Registry`, which fails before any execution_id exists
  /// (`route_to_agent` never runs against a graph execution).
  pub fn execution_id(&self) -> Option<&str> {
    match self {
      ControlError::NotFound { execution_id }
      | ControlError::InvalidTransition { execution_id, .. }
      | ControlError::Store { execution_id, .. }
      | ControlError::Coordinator { execution_id, .. } => Some(execution_id),
      ControlError::Registry { .. } => None,
    }
  }
}
