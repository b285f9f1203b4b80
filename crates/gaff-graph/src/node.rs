use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const HITL_AGENT: &str = "gaff-tools";
pub const HITL_TOOL: &str = "human_in_the_loop";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
  Entry,
  Processing,
  Exit,
  Decision,
  Hitl,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "source_type")]
pub enum InputSourceSpec {
  Constant {
    source: Value,
  },
  Context {
    source: String,
  },
  NodeOutput {
    source_node: String,
    source: String,
  },
  Request {
    source: String,
  },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryBackoff {
  Constant,
  Linear,
  Exponential,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
  #[serde(default = "RetryPolicy::default_max_attempts")]
  pub max_attempts: u32,
  #[serde(default = "RetryPolicy::default_backoff")]
  pub backoff: RetryBackoff,
}

impl RetryPolicy {
  fn default_max_attempts() -> u32 {
    3
  }

  fn default_backoff() -> RetryBackoff {
    RetryBackoff::Exponential
  }
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self {
      max_attempts: Self::default_max_attempts(),
      backoff: Self::default_backoff(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputDecl {
  pub name: String,
  #[serde(rename = "type")]
  pub output_type: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
  pub node_id: String,
  pub agent: String,
  pub tool: String,
  #[serde(default = "default_node_type")]
  pub node_type: NodeType,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub purpose: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub instructions: Option<String>,
  #[serde(default)]
  pub inputs: HashMap<String, Value>,
  #[serde(default)]
  pub outputs: Vec<OutputDecl>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub timeout_ms: Option<u64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub retry_policy: Option<RetryPolicy>,
  /// Legacy advisory dependency list. Edges, not this field, are
  /// authoritative for cycle detection and scheduling.
  #[serde(default)]
  pub dependencies: Vec<String>,
  #[serde(default)]
  pub metadata: HashMap<String, Value>,
}

fn default_node_type() -> NodeType {
  NodeType::Processing
}

impl Node {
  /// Whether this node is a HITL suspension point: either tagged `node_type:
  /// hitl` or targeting the HITL tool directly.
  pub fn is_hitl(&self) -> bool {
    self.node_type == NodeType::Hitl || (self.agent == HITL_AGENT && self.tool == HITL_TOOL)
  }

  pub fn is_auto_injected(&self) -> bool {
    self.node_id.starts_with('_')
      && self
        .metadata
        .get("auto-injected")
        .and_then(Value::as_bool)
        .unwrap_or(false)
  }
}
