//! Orchestration card data model and the prompt/schema builder that feeds
//! the external natural-language-to-card translator.

mod builder;
mod error;
#[cfg(feature = "llm")]
mod llm;
mod model;

pub use builder::{build, parse_and_validate, response_schema, validate, CardPrompt};
pub use error::CardError;
#[cfg(feature = "llm")]
pub use llm::{LlmClient, LlmError, ReqwestChatClient};
pub use model::{
  AgentSummary, Constraints, OptimizeFor, OrchestrationCard, Parallelization, Preferences,
  QualityRequirements, SafetyRequirements, UserRequest,
};

/// Build the prompt pair, dispatch it through `client`, then parse and
/// validate the resulting card. Only available
/// with the `llm` feature; without it, callers drive `build` themselves and
/// hand the prompt to whatever translator they have.
#[cfg(feature = "llm")]
pub async fn build_via_llm(
  query: &str,
  agents: &[gaff_agent_registry::Agent],
  context: Option<&std::collections::HashMap<String, serde_json::Value>>,
  client: &dyn LlmClient,
) -> Result<OrchestrationCard, CardError> {
  let prompt = build(query, agents, context);
  let response = client.complete(&prompt.system_prompt, &prompt.user_prompt).await?;
  parse_and_validate(&response)
}
