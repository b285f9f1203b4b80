//! Functional rewriting of an `IntentGraph` to prepend safety validators and
//! append quality/safety/audit nodes, driven by an orchestration card's
//! `quality_requirements`/`safety_requirements` blocks.

mod inject;

pub use inject::{inject, strip_injected};
