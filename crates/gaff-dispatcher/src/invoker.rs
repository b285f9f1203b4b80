use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use gaff_agent_registry::{Agent, AuthMode};
use serde_json::Value;

use crate::error::InvokeError;

/// The single invocation contract every agent transport implements:
/// `(agent, tool_name, input) -> result`. Concrete variants include an HTTP
/// endpoint, a subprocess tool server, and an in-process mock.
#[async_trait]
pub trait AgentInvoker: Send + Sync {
  async fn invoke(&self, agent: &Agent, tool: &str, input: Value) -> Result<Value, InvokeError>;
}

/// Invokes an agent over HTTP: `POST {endpoint}/{tool}` with the resolved
/// input as a JSON body, the way `fuscia_task::http::execute` builds its
/// request, generalized from a fixed method/url input shape to a
/// fixed-per-agent endpoint plus a tool-name path segment.
pub struct HttpInvoker {
  client: reqwest::Client,
}

impl Default for HttpInvoker {
  fn default() -> Self {
    Self {
      client: reqwest::Client::new(),
    }
  }
}

impl HttpInvoker {
  pub fn new(client: reqwest::Client) -> Self {
    Self { client }
  }
}

#[async_trait]
impl AgentInvoker for HttpInvoker {
  async fn invoke(&self, agent: &Agent, tool: &str, input: Value) -> Result<Value, InvokeError> {
    let endpoint = agent.endpoint.as_deref().ok_or_else(|| InvokeError::Transport {
      agent: agent.name.clone(),
      tool: tool.to_string(),
      message: "agent has no endpoint configured".to_string(),
    })?;
    let url = format!("{}/{}", endpoint.trim_end_matches('/'), tool);

    let mut request = self.client.post(&url).json(&input);
    request = apply_auth(request, &agent.auth);

    let response = request.send().await.map_err(|e| InvokeError::Transport {
      agent: agent.name.clone(),
      tool: tool.to_string(),
      message: e.to_string(),
    })?;

    let status = response.status();
    let body: Value = response.json().await.map_err(|e| InvokeError::Transport {
      agent: agent.name.clone(),
      tool: tool.to_string(),
      message: format!("invalid JSON response: {e}"),
    })?;

    if status.is_client_error() || status.is_server_error() {
      return Err(InvokeError::Application {
        agent: agent.name.clone(),
        tool: tool.to_string(),
        message: format!("http {status}: {body}"),
      });
    }

    Ok(body)
  }
}

fn apply_auth(request: reqwest::RequestBuilder, auth: &AuthMode) -> reqwest::RequestBuilder {
  match auth {
    AuthMode::None => request,
    AuthMode::Bearer { env_var } => match std::env::var(env_var) {
      Ok(token) => request.bearer_auth(token),
      Err(_) => request,
    },
    AuthMode::ApiKeyHeader { header, env_var } => match std::env::var(env_var) {
      Ok(value) => request.header(header, value),
      Err(_) => request,
    },
  }
}

/// In-process invoker backed by a table of closures, keyed by
/// `(agent_name, tool_name)`. Used by the demo binary and by coordinator
/// tests to exercise the full dispatch path without real network I/O.
#[derive(Clone, Default)]
pub struct MockInvoker {
  handlers: HashMap<(String, String), Arc<dyn Fn(Value) -> Result<Value, InvokeError> + Send + Sync>>,
}

impl MockInvoker {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn on(
    mut self,
    agent: impl Into<String>,
    tool: impl Into<String>,
    handler: impl Fn(Value) -> Result<Value, InvokeError> + Send + Sync + 'static,
  ) -> Self {
    self.handlers.insert((agent.into(), tool.into()), Arc::new(handler));
    self
  }
}

#[async_trait]
impl AgentInvoker for MockInvoker {
  async fn invoke(&self, agent: &Agent, tool: &str, input: Value) -> Result<Value, InvokeError> {
    match self.handlers.get(&(agent.name.clone(), tool.to_string())) {
      Some(handler) => handler(input),
      None => Err(InvokeError::Transport {
        agent: agent.name.clone(),
        tool: tool.to_string(),
        message: "no mock handler registered".to_string(),
      }),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use gaff_graph::RetryPolicy;
  use serde_json::json;

  fn agent(name: &str) -> Agent {
    Agent {
      name: name.into(),
      agent_type: "mock".into(),
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

  #[tokio::test]
  async fn mock_invoker_dispatches_registered_handler() {
    let invoker = MockInvoker::new().on("weather", "forecast", |input| {
      Ok(json!({"echo": input}))
    });
    let result = invoker.invoke(&agent("weather"), "forecast", json!({"city": "nyc"})).await.unwrap();
    assert_eq!(result, json!({"echo": {"city": "nyc"}}));
  }

  #[tokio::test]
  async fn mock_invoker_missing_handler_is_transport_error() {
    let invoker = MockInvoker::new();
    let result = invoker.invoke(&agent("weather"), "forecast", json!({})).await;
    assert!(matches!(result, Err(InvokeError::Transport { .. })));
  }
}
