use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use tokio::fs;

use crate::agent::Agent;
use crate::error::RegistryError;

/// Read-only lookup surface over a loaded agent catalog. A catalog is
/// immutable for the lifetime of an execution; implementers may
/// back this with the in-memory catalog below or a remote source.
#[async_trait]
pub trait AgentRegistry: Send + Sync {
  async fn get(&self, name: &str) -> Result<Agent, RegistryError>;
  async fn list(&self) -> Result<Vec<Agent>, RegistryError>;
}

/// The agent catalog: a name-keyed table loaded once at startup from a
/// single JSON document (`GAFF_CONFIG_PATH` or `--config`), the way the
/// root binary loads a workflow file — read to string, then
/// `serde_json::from_str`.
#[derive(Debug, Clone, Default)]
pub struct AgentCatalog {
  agents: HashMap<String, Agent>,
}

impl AgentCatalog {
  pub fn new(agents: Vec<Agent>) -> Result<Self, RegistryError> {
    let mut map = HashMap::with_capacity(agents.len());
    for agent in agents {
      let name = agent.name.clone();
      if map.insert(name.clone(), agent).is_some() {
        return Err(RegistryError::DuplicateAgent { name });
      }
    }
    Ok(Self { agents: map })
  }

  /// Load a catalog document of shape `{"agents": [...]}` from disk.
  pub async fn load(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
      .await
      .map_err(|source| RegistryError::Io {
        path: path.display().to_string(),
        source,
      })?;
    Self::from_json_str(&content, path)
  }

  fn from_json_str(content: &str, path: &Path) -> Result<Self, RegistryError> {
    #[derive(serde::Deserialize)]
    struct CatalogDoc {
      agents: Vec<Agent>,
    }
    let doc: CatalogDoc =
      serde_json::from_str(content).map_err(|source| RegistryError::InvalidCatalog {
        path: path.display().to_string(),
        source,
      })?;
    Self::new(doc.agents)
  }

  pub fn get(&self, name: &str) -> Option<&Agent> {
    self.agents.get(name)
  }

  pub fn list(&self) -> Vec<&Agent> {
    self.agents.values().collect()
  }

  pub fn len(&self) -> usize {
    self.agents.len()
  }

  pub fn is_empty(&self) -> bool {
    self.agents.is_empty()
  }
}

#[async_trait]
impl AgentRegistry for AgentCatalog {
  async fn get(&self, name: &str) -> Result<Agent, RegistryError> {
    self
      .agents
      .get(name)
      .cloned()
      .ok_or_else(|| RegistryError::NotFound { name: name.to_string() })
  }

  async fn list(&self) -> Result<Vec<Agent>, RegistryError> {
    Ok(self.agents.values().cloned().collect())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::agent::AuthMode;
  use gaff_graph::RetryPolicy;
  use serde_json::json;

  fn agent(name: &str) -> Agent {
    Agent {
      name: name.into(),
      agent_type: "http".into(),
      description: String::new(),
      capabilities: vec![],
      endpoint: None,
      auth: AuthMode::None,
      timeout_ms: None,
      retry_policy: RetryPolicy::default(),
      input_schema: json!({}),
      output_schema: json!({}),
    }
  }

  #[test]
  fn catalog_lookup_by_name() {
    let catalog = AgentCatalog::new(vec![agent("weather"), agent("translate")]).unwrap();
    assert!(catalog.get("weather").is_some());
    assert!(catalog.get("missing").is_none());
    assert_eq!(catalog.len(), 2);
  }

  #[test]
  fn duplicate_agent_name_is_rejected() {
    let result = AgentCatalog::new(vec![agent("weather"), agent("weather")]);
    assert!(matches!(result, Err(RegistryError::DuplicateAgent { .. })));
  }

  #[tokio::test]
  async fn registry_trait_get_and_list() {
    let catalog = AgentCatalog::new(vec![agent("weather")]).unwrap();
    let found = catalog.get("weather").await.unwrap();
    assert_eq!(found.name, "weather");
    assert_eq!(catalog.list().await.unwrap().len(), 1);
    assert!(matches!(
      catalog.get("missing").await,
      Err(RegistryError::NotFound { .. })
    ));
  }

  #[test]
  fn parses_catalog_document() {
    let doc = json!({
      "agents": [
        {"name": "weather", "type": "http", "capabilities": ["forecast"]}
      ]
    });
    let catalog = AgentCatalog::from_json_str(&doc.to_string(), Path::new("catalog.json")).unwrap();
    assert_eq!(catalog.get("weather").unwrap().agent_type, "http");
  }
}
