use gaff_core::ErrorKind;
use gaff_graph::GraphError;
use gaff_scheduler::ScheduleError;
use thiserror::Error;

/// Failures the coordinator itself raises, as opposed to per-node failures
/// which are carried inside a `ResultEnvelope` and never abort the run
/// the coordinator never silently discards an error.
#[derive(Debug, Error)]
pub enum CoordinatorError {
  #[error("execution {execution_id} has an invalid graph: {source}")]
  GraphInvalid {
    execution_id: String,
    #[source]
    source: GraphError,
  },

  #[error("execution {execution_id} could not be scheduled: {source}")]
  Schedule {
    execution_id: String,
    #[source]
    source: ScheduleError,
  },

  #[error("execution {execution_id} not found")]
  NotFound { execution_id: String },

  #[error("invalid transition for execution {execution_id}: {message}")]
  InvalidTransition { execution_id: String, message: String },
}

impl CoordinatorError {
  pub fn kind(&self) -> ErrorKind {
    match self {
      CoordinatorError::GraphInvalid { .. } => ErrorKind::GraphInvalid,
      CoordinatorError::Schedule { .. } => ErrorKind::GraphInvalid,
      CoordinatorError::NotFound { .. } => ErrorKind::PersistenceFailure,
      CoordinatorError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
    }
  }

  pub fn execution_id(&self) -> &str {
    match self {
      CoordinatorError::GraphInvalid { execution_id, .. }
      | CoordinatorError::Schedule { execution_id, .. }
      | CoordinatorError::NotFound { execution_id }
      | CoordinatorError::InvalidTransition { execution_id, .. } => execution_id,
    }
  }
}
