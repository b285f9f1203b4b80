//! External control surface over a running coordinator: execute, status,
//! pause, resume, cancel, and an ad-hoc route_to_agent operation served
//! against the state store and agent registry.

mod error;
mod operations;
mod types;

pub use error::ControlError;
pub use operations::ControlApi;
pub use types::{CancelAck, PauseAck, ResumeAck, StatusSnapshot};
