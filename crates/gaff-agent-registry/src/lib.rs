//! The agent catalog: the immutable, startup-loaded table of named agents
//! a graph's nodes may target.

mod agent;
mod catalog;
mod error;

pub use agent::{Agent, AuthMode};
pub use catalog::{AgentCatalog, AgentRegistry};
pub use error::RegistryError;
