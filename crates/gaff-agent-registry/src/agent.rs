use std::collections::HashSet;

use gaff_graph::RetryPolicy;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How the dispatcher authenticates to an agent's endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum AuthMode {
  /// No authentication — in-process mocks and trusted local agents.
  None,
  /// `Authorization: Bearer <value of env_var>`.
  Bearer { env_var: String },
  /// A custom header carrying the value of an environment variable.
  ApiKeyHeader { header: String, env_var: String },
}

impl Default for AuthMode {
  fn default() -> Self {
    AuthMode::None
  }
}

/// A catalog entry: the immutable, startup-loaded description of one named
/// agent a graph's nodes may target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
  pub name: String,
  #[serde(rename = "type")]
  pub agent_type: String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub capabilities: Vec<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub endpoint: Option<String>,
  #[serde(default)]
  pub auth: AuthMode,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub timeout_ms: Option<u64>,
  #[serde(default)]
  pub retry_policy: RetryPolicy,
  #[serde(default = "default_schema")]
  pub input_schema: Value,
  #[serde(default = "default_schema")]
  pub output_schema: Value,
}

fn default_schema() -> Value {
  Value::Object(serde_json::Map::new())
}

impl Agent {
  pub fn has_capability(&self, tag: &str) -> bool {
    self.capabilities.iter().any(|c| c == tag)
  }

  pub fn capability_set(&self) -> HashSet<&str> {
    self.capabilities.iter().map(String::as_str).collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn default_auth_mode_is_none() {
    assert_eq!(AuthMode::default(), AuthMode::None);
  }

  #[test]
  fn has_capability_checks_membership() {
    let agent = Agent {
      name: "weather".into(),
      agent_type: "http".into(),
      description: String::new(),
      capabilities: vec!["forecast".into(), "geocoding".into()],
      endpoint: None,
      auth: AuthMode::None,
      timeout_ms: None,
      retry_policy: RetryPolicy::default(),
      input_schema: default_schema(),
      output_schema: default_schema(),
    };
    assert!(agent.has_capability("forecast"));
    assert!(!agent.has_capability("translation"));
  }
}
