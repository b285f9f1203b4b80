use std::collections::HashMap;
use std::collections::HashSet;

use gaff_agent_registry::Agent;
use serde_json::{json, Value};

use crate::error::CardError;
use crate::model::{AgentSummary, OrchestrationCard};

/// The system/user prompt pair and JSON schema a downstream LLM call must
/// conform to, constructed from a natural-language query and the catalog of
/// agents it may choose from. Building this is pure; nothing
/// here makes a network call.
#[derive(Debug, Clone)]
pub struct CardPrompt {
  pub system_prompt: String,
  pub user_prompt: String,
  pub response_schema: Value,
}

/// Construct the prompt pair and schema for a query against a selected
/// agent catalog. `context` seeds free-form key/value hints (e.g. a prior
/// conversation turn) into the user prompt.
pub fn build(
  query: &str,
  agents: &[Agent],
  context: Option<&HashMap<String, Value>>,
) -> CardPrompt {
  let summaries: Vec<AgentSummary> = agents.iter().map(AgentSummary::from).collect();

  let system_prompt = concat!(
    "You translate a natural-language workflow request into an orchestration card.\n",
    "Respond with a single JSON object conforming exactly to the provided schema.\n",
    "Select only from the agents listed; do not invent agent names or tools.",
  )
  .to_string();

  let mut user_prompt = format!("Request: {query}\n\nAvailable agents:\n");
  for agent in &summaries {
    user_prompt.push_str(&format!(
      "- {} ({}): {}\n",
      agent.name,
      agent.agent_type,
      agent.description.as_deref().unwrap_or("no description")
    ));
  }
  if let Some(context) = context {
    if !context.is_empty() {
      user_prompt.push_str("\nContext:\n");
      for (key, value) in context {
        user_prompt.push_str(&format!("- {key}: {value}\n"));
      }
    }
  }

  CardPrompt {
    system_prompt,
    user_prompt,
    response_schema: response_schema(),
  }
}

/// The required JSON schema top-level keys:
/// `user_request`, `available_agents`, `constraints`, `preferences`, with
/// optional `quality_requirements`/`safety_requirements`.
pub fn response_schema() -> Value {
  json!({
    "type": "object",
    "required": ["user_request", "available_agents", "constraints", "preferences"],
    "properties": {
      "user_request": {
        "type": "object",
        "required": ["description"],
        "properties": {
          "description": {"type": "string"},
          "domain": {"type": "string"},
          "success_criteria": {"type": "array", "items": {"type": "string"}},
        },
      },
      "available_agents": {
        "type": "array",
        "items": {
          "type": "object",
          "required": ["name", "type", "capabilities", "input_schema", "output_schema"],
          "properties": {
            "name": {"type": "string"},
            "type": {"type": "string"},
            "capabilities": {"type": "array", "items": {"type": "string"}},
            "description": {"type": "string"},
            "input_schema": {"type": "object"},
            "output_schema": {"type": "object"},
          },
        },
      },
      "constraints": {
        "type": "object",
        "properties": {
          "max_execution_time_ms": {"type": "integer"},
          "max_cost_per_execution": {"type": "number"},
          "max_retries": {"type": "integer"},
        },
      },
      "preferences": {
        "type": "object",
        "properties": {
          "optimize_for": {"enum": ["speed", "cost", "reliability", "balanced"]},
          "parallelization": {"enum": ["none", "conservative", "balanced", "aggressive"]},
        },
      },
      "quality_requirements": {"type": "object"},
      "safety_requirements": {"type": "object"},
    },
  })
}

/// Parse an LLM (or any caller's) JSON response into a card, with serde's
/// field-level defaults already applied by deserialization, then validate
/// its shape.
pub fn parse_and_validate(response: &str) -> Result<OrchestrationCard, CardError> {
  let card: OrchestrationCard = serde_json::from_str(response)?;
  validate(&card)?;
  Ok(card)
}

/// Shape checks beyond what serde's defaults already guarantee: a
/// non-empty description, at least one selected agent, and unique agent
/// names (a card referencing the same agent twice is ambiguous for the
/// graph generator).
pub fn validate(card: &OrchestrationCard) -> Result<(), CardError> {
  if card.user_request.description.trim().is_empty() {
    return Err(CardError::Invalid {
      message: "user_request.description must not be empty".to_string(),
    });
  }
  if card.available_agents.is_empty() {
    return Err(CardError::Invalid {
      message: "available_agents must not be empty".to_string(),
    });
  }
  let mut seen = HashSet::new();
  for agent in &card.available_agents {
    if !seen.insert(agent.name.as_str()) {
      return Err(CardError::Invalid {
        message: format!("duplicate agent in card: {}", agent.name),
      });
    }
  }
  Ok(())
}
