use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Describes *what* to build: the user's request, the agents selected to
/// build it, and the constraints/preferences/requirements that shape graph
/// generation and injection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestrationCard {
  pub user_request: UserRequest,
  pub available_agents: Vec<AgentSummary>,
  #[serde(default)]
  pub constraints: Constraints,
  #[serde(default)]
  pub preferences: Preferences,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub quality_requirements: Option<QualityRequirements>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub safety_requirements: Option<SafetyRequirements>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRequest {
  pub description: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub domain: Option<String>,
  #[serde(default)]
  pub success_criteria: Vec<String>,
}

/// A catalog agent as embedded in a card, with its schemas carried inline
/// so the graph generator doesn't need to re-consult the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSummary {
  pub name: String,
  #[serde(rename = "type")]
  pub agent_type: String,
  #[serde(default)]
  pub capabilities: Vec<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  pub input_schema: Value,
  pub output_schema: Value,
}

impl From<&gaff_agent_registry::Agent> for AgentSummary {
  fn from(agent: &gaff_agent_registry::Agent) -> Self {
    Self {
      name: agent.name.clone(),
      agent_type: agent.agent_type.clone(),
      capabilities: agent.capabilities.clone(),
      description: Some(agent.description.clone()).filter(|d| !d.is_empty()),
      input_schema: agent.input_schema.clone(),
      output_schema: agent.output_schema.clone(),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizeFor {
  Speed,
  Cost,
  Reliability,
  Balanced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Parallelization {
  None,
  Conservative,
  Balanced,
  Aggressive,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Constraints {
  #[serde(default = "Constraints::default_max_execution_time_ms")]
  pub max_execution_time_ms: u64,
  #[serde(default = "Constraints::default_max_cost_per_execution")]
  pub max_cost_per_execution: f64,
  #[serde(default = "Constraints::default_max_retries")]
  pub max_retries: u32,
}

impl Constraints {
  fn default_max_execution_time_ms() -> u64 {
    300_000
  }
  fn default_max_cost_per_execution() -> f64 {
    10.0
  }
  fn default_max_retries() -> u32 {
    3
  }
}

impl Default for Constraints {
  fn default() -> Self {
    Self {
      max_execution_time_ms: Self::default_max_execution_time_ms(),
      max_cost_per_execution: Self::default_max_cost_per_execution(),
      max_retries: Self::default_max_retries(),
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preferences {
  #[serde(default = "Preferences::default_optimize_for")]
  pub optimize_for: OptimizeFor,
  #[serde(default = "Preferences::default_parallelization")]
  pub parallelization: Parallelization,
}

impl Preferences {
  fn default_optimize_for() -> OptimizeFor {
    OptimizeFor::Balanced
  }
  fn default_parallelization() -> Parallelization {
    Parallelization::Balanced
  }
}

impl Default for Preferences {
  fn default() -> Self {
    Self {
      optimize_for: Self::default_optimize_for(),
      parallelization: Self::default_parallelization(),
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityRequirements {
  #[serde(default)]
  pub enabled: bool,
  #[serde(default)]
  pub auto_validate: bool,
}

/// Presence of `input_validation` (any non-null value) is what the injector
/// checks for, not its contents, so it's carried as an opaque config blob
/// when present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyRequirements {
  #[serde(default)]
  pub enabled: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub input_validation: Option<Value>,
  #[serde(default)]
  pub compliance_standards: Vec<String>,
  #[serde(default)]
  pub output_validation: bool,
  #[serde(default)]
  pub audit_logging: bool,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn constraints_default_matches_spec() {
    let c = Constraints::default();
    assert_eq!(c.max_execution_time_ms, 300_000);
    assert_eq!(c.max_cost_per_execution, 10.0);
    assert_eq!(c.max_retries, 3);
  }

  #[test]
  fn preferences_default_is_balanced() {
    let p = Preferences::default();
    assert_eq!(p.optimize_for, OptimizeFor::Balanced);
    assert_eq!(p.parallelization, Parallelization::Balanced);
  }

  #[test]
  fn missing_optional_fields_apply_defaults_on_parse() {
    let card: OrchestrationCard = serde_json::from_value(serde_json::json!({
      "user_request": {"description": "build something"},
      "available_agents": [],
    }))
    .unwrap();
    assert_eq!(card.constraints.max_retries, 3);
    assert_eq!(card.preferences.optimize_for, OptimizeFor::Balanced);
    assert!(card.user_request.success_criteria.is_empty());
  }
}
