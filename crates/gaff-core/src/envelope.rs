use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ErrorKind;

/// Uniform per-node outcome record. Produced by the dispatcher, stored
/// verbatim in execution state, and returned to control-API callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultEnvelope {
  pub success: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub result: Option<Value>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error: Option<EnvelopeError>,
  pub attempts: u32,
  pub duration_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvelopeError {
  pub message: String,
  pub kind: ErrorKind,
}

impl ResultEnvelope {
  pub fn success(result: Value, attempts: u32, duration_ms: u64) -> Self {
    Self {
      success: true,
      result: Some(result),
      error: None,
      attempts,
      duration_ms,
    }
  }

  pub fn failure(
    message: impl Into<String>,
    kind: ErrorKind,
    attempts: u32,
    duration_ms: u64,
  ) -> Self {
    Self {
      success: false,
      result: None,
      error: Some(EnvelopeError {
        message: message.into(),
        kind,
      }),
      attempts,
      duration_ms,
    }
  }
}
