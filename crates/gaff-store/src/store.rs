use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use gaff_core::ResultEnvelope;
use tokio::sync::RwLock;
use tracing::warn;

use crate::error::StoreError;
use crate::types::ExecutionState;

/// Execution-state persistence against an external key-addressable store.
/// The connection (where one exists) is established lazily on first use and
/// retained for the process lifetime.
#[async_trait]
pub trait StateStore: Send + Sync {
  async fn put(&self, state: &ExecutionState) -> Result<(), StoreError>;
  async fn get(&self, execution_id: &str) -> Result<Option<ExecutionState>, StoreError>;
  async fn put_node_result(
    &self,
    execution_id: &str,
    node_id: &str,
    result: &ResultEnvelope,
  ) -> Result<(), StoreError>;
}

/// In-process store used by the demo binary and tests. Also the fallback
/// the coordinator can use when `config.store_state_in_memory` is set and
/// no external memory-store client is configured.
#[derive(Clone, Default)]
pub struct InMemoryStore {
  inner: Arc<RwLock<HashMap<String, ExecutionState>>>,
}

impl InMemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

#[async_trait]
impl StateStore for InMemoryStore {
  async fn put(&self, state: &ExecutionState) -> Result<(), StoreError> {
    self
      .inner
      .write()
      .await
      .insert(state.execution_id.clone(), state.clone());
    Ok(())
  }

  async fn get(&self, execution_id: &str) -> Result<Option<ExecutionState>, StoreError> {
    Ok(self.inner.read().await.get(execution_id).cloned())
  }

  async fn put_node_result(
    &self,
    execution_id: &str,
    node_id: &str,
    result: &ResultEnvelope,
  ) -> Result<(), StoreError> {
    let mut guard = self.inner.write().await;
    match guard.get_mut(execution_id) {
      Some(state) => {
        state.results.insert(node_id.to_string(), result.clone());
        state.touch();
        Ok(())
      }
      None => {
        warn!(execution_id, node_id, "put_node_result for unknown execution");
        Err(StoreError::NotFound {
          execution_id: execution_id.to_string(),
        })
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use gaff_graph::{ExecutionPlan, ExecutionStrategy, IntentGraph};
  use serde_json::json;
  use std::collections::HashMap as Map;

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

  #[tokio::test]
  async fn round_trip_put_get() {
    let store = InMemoryStore::new();
    let state = ExecutionState::new("exec-1", empty_graph(), Map::new());
    store.put(&state).await.unwrap();
    let fetched = store.get("exec-1").await.unwrap().unwrap();
    assert_eq!(fetched.execution_id, "exec-1");
  }

  #[tokio::test]
  async fn get_missing_execution_is_none() {
    let store = InMemoryStore::new();
    assert!(store.get("missing").await.unwrap().is_none());
  }

  #[tokio::test]
  async fn put_node_result_updates_existing_state() {
    let store = InMemoryStore::new();
    let state = ExecutionState::new("exec-1", empty_graph(), Map::new());
    store.put(&state).await.unwrap();
    let envelope = ResultEnvelope::success(json!({"x": 1}), 1, 5);
    store.put_node_result("exec-1", "a", &envelope).await.unwrap();
    let fetched = store.get("exec-1").await.unwrap().unwrap();
    assert_eq!(fetched.results["a"].result, Some(json!({"x": 1})));
  }

  #[tokio::test]
  async fn put_node_result_for_unknown_execution_errors() {
    let store = InMemoryStore::new();
    let envelope = ResultEnvelope::success(json!(1), 1, 1);
    let result = store.put_node_result("missing", "a", &envelope).await;
    assert!(matches!(result, Err(StoreError::NotFound { .. })));
  }
}
