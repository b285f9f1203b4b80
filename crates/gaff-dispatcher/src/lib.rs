//! Agent invocation with timeout, retry, backoff, and a standardized result
//! envelope.

mod backoff;
mod dispatch;
mod error;
mod invoker;

pub use dispatch::dispatch;
pub use error::InvokeError;
pub use invoker::{AgentInvoker, HttpInvoker, MockInvoker};
