use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
  #[error("execution not found: {execution_id}")]
  NotFound { execution_id: String },

  #[error("failed to serialize execution state for {execution_id}: {source}")]
  Serialize {
    execution_id: String,
    #[source]
    source: serde_json::Error,
  },

  #[error("failed to deserialize execution state for {execution_id}: {source}")]
  Deserialize {
    execution_id: String,
    #[source]
    source: serde_json::Error,
  },

  #[error("memory store entity observations for {execution_id} are malformed: {message}")]
  MalformedEntity {
    execution_id: String,
    message: String,
  },

  #[error("memory store transport error: {message}")]
  Transport { message: String },
}
