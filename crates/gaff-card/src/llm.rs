//! The `build_via_llm` path: a pluggable chat-completion client
//! plus a generic reqwest-backed implementation. No specific vendor's wire
//! format is implemented beyond the common `{messages: [...], choices:
//! [{message: {content}}]}` chat-completion shape, grounded on the
//! `ChatModel`-trait-plus-concrete-client split used across the wider
//! example pack's `llm` provider crate.

use async_trait::async_trait;
use thiserror::Error;

/// Errors a chat-completion call can surface. Modeled on the wider example
/// pack's `llm::LlmError`: `is_retryable`/`is_auth_error` let the card
/// builder's caller decide whether to retry without matching on variants.
#[derive(Debug, Error)]
pub enum LlmError {
  #[error("http request failed: {0}")]
  Http(#[from] reqwest::Error),

  #[error("api key not found in environment: {0}")]
  ApiKeyNotFound(String),

  #[error("authentication failed: {0}")]
  AuthenticationError(String),

  #[error("rate limit exceeded: {0}")]
  RateLimitExceeded(String),

  #[error("invalid response from provider: {0}")]
  InvalidResponse(String),
}

impl LlmError {
  pub fn is_retryable(&self) -> bool {
    matches!(self, LlmError::Http(_) | LlmError::RateLimitExceeded(_))
  }

  pub fn is_auth_error(&self) -> bool {
    matches!(self, LlmError::ApiKeyNotFound(_) | LlmError::AuthenticationError(_))
  }
}

/// A pluggable chat-completion client. `gaff-card` only needs the query/
/// response shape; the natural-language-to-card
/// translator itself is an external collaborator.
#[async_trait]
pub trait LlmClient: Send + Sync {
  async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String, LlmError>;
}

/// Generic OpenAI-shaped chat-completion client: `POST {base_url}/chat/completions`
/// with `{model, messages: [{role, content}]}`, reading `choices[0].message.content`
/// back out. Works against any provider that speaks this common dialect.
pub struct ReqwestChatClient {
  client: reqwest::Client,
  base_url: String,
  model: String,
  api_key_env_var: String,
}

impl ReqwestChatClient {
  pub fn new(base_url: impl Into<String>, model: impl Into<String>, api_key_env_var: impl Into<String>) -> Self {
    Self {
      client: reqwest::Client::new(),
      base_url: base_url.into(),
      model: model.into(),
      api_key_env_var: api_key_env_var.into(),
    }
  }
}

#[async_trait]
impl LlmClient for ReqwestChatClient {
  async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String, LlmError> {
    let api_key = std::env::var(&self.api_key_env_var)
      .map_err(|_| LlmError::ApiKeyNotFound(self.api_key_env_var.clone()))?;

    let body = serde_json::json!({
      "model": self.model,
      "messages": [
        {"role": "system", "content": system_prompt},
        {"role": "user", "content": user_prompt},
      ],
    });

    let response = self
      .client
      .post(format!("{}/chat/completions", self.base_url.trim_end_matches('/')))
      .bearer_auth(api_key)
      .json(&body)
      .send()
      .await?;

    let status = response.status();
    if status.as_u16() == 401 || status.as_u16() == 403 {
      return Err(LlmError::AuthenticationError(format!("http {status}")));
    }
    if status.as_u16() == 429 {
      return Err(LlmError::RateLimitExceeded(format!("http {status}")));
    }

    let value: serde_json::Value = response.json().await?;
    value["choices"][0]["message"]["content"]
      .as_str()
      .map(|s| s.to_string())
      .ok_or_else(|| LlmError::InvalidResponse("missing choices[0].message.content".to_string()))
  }
}
