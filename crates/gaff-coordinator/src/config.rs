use serde::{Deserialize, Serialize};

/// Execution-wide settings. Every field carries its
/// literal default so a caller can send `{}` and get the documented
/// behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatorConfig {
  #[serde(default = "CoordinatorConfig::default_max_parallel")]
  pub max_parallel: usize,
  #[serde(default = "CoordinatorConfig::default_timeout_ms")]
  pub timeout_ms: u64,
  #[serde(default)]
  pub enable_quality_check: bool,
  #[serde(default = "CoordinatorConfig::default_enable_hitl")]
  pub enable_hitl: bool,
  #[serde(default = "CoordinatorConfig::default_max_retries")]
  pub max_retries: u32,
  #[serde(default = "CoordinatorConfig::default_store_state_in_memory")]
  pub store_state_in_memory: bool,
}

impl CoordinatorConfig {
  fn default_max_parallel() -> usize {
    5
  }

  fn default_timeout_ms() -> u64 {
    300_000
  }

  fn default_enable_hitl() -> bool {
    true
  }

  fn default_max_retries() -> u32 {
    3
  }

  fn default_store_state_in_memory() -> bool {
    true
  }
}

impl Default for CoordinatorConfig {
  fn default() -> Self {
    Self {
      max_parallel: Self::default_max_parallel(),
      timeout_ms: Self::default_timeout_ms(),
      enable_quality_check: false,
      enable_hitl: Self::default_enable_hitl(),
      max_retries: Self::default_max_retries(),
      store_state_in_memory: Self::default_store_state_in_memory(),
    }
  }
}
