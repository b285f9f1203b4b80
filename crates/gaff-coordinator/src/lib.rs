//! Batch-barrier execution coordinator: schedules a validated intent graph,
//! dispatches each wave with bounded parallelism, resolves `${...}`
//! references between nodes, and suspends at HITL gates.

mod config;
mod coordinator;
mod error;
mod result;

pub use config::CoordinatorConfig;
pub use coordinator::Coordinator;
pub use error::CoordinatorError;
pub use result::{ApprovalDecision, ExecutionOutcome, PausedExecution, SettledExecution};
