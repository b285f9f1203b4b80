use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
  #[error("agent not found: {name}")]
  NotFound { name: String },

  #[error("duplicate agent name in catalog: {name}")]
  DuplicateAgent { name: String },

  #[error("failed to read agent catalog at {path}: {source}")]
  Io {
    path: String,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse agent catalog at {path}: {source}")]
  InvalidCatalog {
    path: String,
    #[source]
    source: serde_json::Error,
  },
}
