use async_trait::async_trait;
use gaff_core::ResultEnvelope;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::StoreError;
use crate::store::StateStore;
use crate::types::ExecutionState;

const ENTITY_TYPE: &str = "execution_state";

/// One entity as written through `create_entities`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityInput {
  pub name: String,
  pub entity_type: String,
  pub observations: Vec<String>,
}

/// One entity as returned from `open_nodes`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityOutput {
  pub name: String,
  #[serde(default)]
  pub entity_type: String,
  pub observations: Vec<String>,
}

/// The two tools this crate consumes from an external memory-entity store.
/// A process-wide singleton implementation may reuse one connection, but
/// that lifecycle is the implementer's concern, not this trait's: a
/// connection is established lazily on first use and retained for the
/// process lifetime.
#[async_trait]
pub trait MemoryClient: Send + Sync {
  async fn create_entities(&self, entities: Vec<EntityInput>) -> Result<(), StoreError>;
  async fn open_nodes(&self, names: Vec<String>) -> Result<Vec<EntityOutput>, StoreError>;
}

/// `StateStore` backed by the `create_entities`/`open_nodes` memory-store
/// protocol. Each execution is one entity named by its execution id, with
/// observations `["state: <json>", "metadata: <json>"]`.
pub struct McpMemoryStore<C> {
  client: C,
}

impl<C: MemoryClient> McpMemoryStore<C> {
  pub fn new(client: C) -> Self {
    Self { client }
  }
}

#[derive(Serialize)]
struct Metadata<'a> {
  execution_id: &'a str,
  status: &'a str,
  updated_at: chrono::DateTime<chrono::Utc>,
}

#[async_trait]
impl<C: MemoryClient> StateStore for McpMemoryStore<C> {
  async fn put(&self, state: &ExecutionState) -> Result<(), StoreError> {
    let state_json = serde_json::to_string(state).map_err(|source| StoreError::Serialize {
      execution_id: state.execution_id.clone(),
      source,
    })?;
    let metadata = Metadata {
      execution_id: &state.execution_id,
      status: &format!("{:?}", state.status),
      updated_at: state.updated_at,
    };
    let metadata_json =
      serde_json::to_string(&metadata).map_err(|source| StoreError::Serialize {
        execution_id: state.execution_id.clone(),
        source,
      })?;

    self
      .client
      .create_entities(vec![EntityInput {
        name: state.execution_id.clone(),
        entity_type: ENTITY_TYPE.to_string(),
        observations: vec![
          format!("state: {state_json}"),
          format!("metadata: {metadata_json}"),
        ],
      }])
      .await
  }

  async fn get(&self, execution_id: &str) -> Result<Option<ExecutionState>, StoreError> {
    let mut entities = self.client.open_nodes(vec![execution_id.to_string()]).await?;
    let Some(entity) = entities.pop() else {
      return Ok(None);
    };

    let state_observation = entity
      .observations
      .iter()
      .find_map(|obs| obs.strip_prefix("state: "))
      .ok_or_else(|| StoreError::MalformedEntity {
        execution_id: execution_id.to_string(),
        message: "missing 'state:' observation".to_string(),
      })?;

    let state: ExecutionState =
      serde_json::from_str(state_observation).map_err(|source| StoreError::Deserialize {
        execution_id: execution_id.to_string(),
        source,
      })?;
    Ok(Some(state))
  }

  async fn put_node_result(
    &self,
    execution_id: &str,
    node_id: &str,
    result: &ResultEnvelope,
  ) -> Result<(), StoreError> {
    // Node-scoped incremental write: read the current snapshot, fold in the
    // new result, write the whole entity back. The full-state `put` above
    // remains the coordinator's primary write path; this exists for callers
    // that only have a single node's result in hand.
    let mut state = self.get(execution_id).await?.ok_or_else(|| StoreError::NotFound {
      execution_id: execution_id.to_string(),
    })?;
    state.results.insert(node_id.to_string(), result.clone());
    state.touch();
    self.put(&state).await
  }
}

/// Convenience constructor mirroring the store's literal observation shape,
/// useful for tests asserting on the wire format rather than round-tripping
/// through `put`/`get`.
pub fn entity_for(state: &ExecutionState) -> serde_json::Value {
  json!({
    "name": state.execution_id,
    "entityType": ENTITY_TYPE,
    "observations": [
      format!("state: {}", serde_json::to_string(state).unwrap_or_default()),
    ],
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use gaff_graph::{ExecutionPlan, ExecutionStrategy, IntentGraph};
  use std::collections::HashMap;
  use std::sync::Mutex;

  fn empty_graph() -> IntentGraph {
    IntentGraph {
      nodes: vec![],
      edges: vec![],
      execution_plan: ExecutionPlan {
        entry_points: vec![],
        exit_points: vec![],
        strategy: ExecutionStrategy::Hybrid,
      },
    }
  }

  #[derive(Default)]
  struct FakeMemoryClient {
    entities: Mutex<HashMap<String, EntityInput>>,
  }

  #[async_trait]
  impl MemoryClient for FakeMemoryClient {
    async fn create_entities(&self, entities: Vec<EntityInput>) -> Result<(), StoreError> {
      let mut guard = self.entities.lock().unwrap();
      for entity in entities {
        guard.insert(entity.name.clone(), entity);
      }
      Ok(())
    }

    async fn open_nodes(&self, names: Vec<String>) -> Result<Vec<EntityOutput>, StoreError> {
      let guard = self.entities.lock().unwrap();
      Ok(
        names
          .iter()
          .filter_map(|name| guard.get(name))
          .map(|e| EntityOutput {
            name: e.name.clone(),
            entity_type: e.entity_type.clone(),
            observations: e.observations.clone(),
          })
          .collect(),
      )
    }
  }

  #[tokio::test]
  async fn round_trips_through_fake_memory_client() {
    let store = McpMemoryStore::new(FakeMemoryClient::default());
    let state = ExecutionState::new("exec-1", empty_graph(), HashMap::new());
    store.put(&state).await.unwrap();
    let fetched = store.get("exec-1").await.unwrap().unwrap();
    assert_eq!(fetched.execution_id, "exec-1");
  }

  #[tokio::test]
  async fn get_missing_entity_is_none() {
    let store = McpMemoryStore::new(FakeMemoryClient::default());
    assert!(store.get("missing").await.unwrap().is_none());
  }

  #[tokio::test]
  async fn put_node_result_requires_existing_entity() {
    let store = McpMemoryStore::new(FakeMemoryClient::default());
    let result = ResultEnvelope::success(serde_json::json!(1), 1, 1);
    let err = store.put_node_result("missing", "a", &result).await;
    assert!(matches!(err, Err(StoreError::NotFound { .. })));
  }
}
