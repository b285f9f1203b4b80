use thiserror::Error;

#[derive(Debug, Error)]
pub enum CardError {
  #[error("orchestration card is invalid: {message}")]
  Invalid { message: String },

  #[error("failed to parse orchestration card: {0}")]
  Parse(#[from] serde_json::Error),

  #[cfg(feature = "llm")]
  #[error("llm client error: {0}")]
  Llm(#[from] crate::llm::LlmError),
}
