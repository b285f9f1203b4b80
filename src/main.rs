use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;

use gaff_agent_registry::{Agent, AgentCatalog, AgentRegistry, AuthMode};
use gaff_coordinator::{Coordinator, CoordinatorConfig, ExecutionOutcome};
use gaff_dispatcher::{AgentInvoker, HttpInvoker, MockInvoker};
use gaff_graph::{Edge, ExecutionPlan, ExecutionStrategy, IntentGraph, Node, NodeType, OutputDecl, RetryPolicy};
use gaff_store::{InMemoryStore, StateStore};

/// gaff - an intent-graph execution engine: validates, schedules and
/// dispatches a DAG of named-agent operations with durable state and
/// human-in-the-loop suspension.
#[derive(Parser)]
#[command(name = "gaff")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Path to the agent catalog document (falls back to GAFF_CONFIG_PATH).
  #[arg(long, global = true)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Validate, schedule and execute an intent graph read from disk.
  Execute {
    /// Path to the intent graph document (JSON).
    graph_file: PathBuf,

    /// Optional JSON document seeding the execution's context map.
    #[arg(long)]
    context_file: Option<PathBuf>,
  },

  /// Run the linear three-node scenario end-to-end against in-process
  /// mock agents, with no external services or catalog required.
  Demo,
}

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .init();

  let cli = Cli::parse();

  match cli.command {
    Some(Commands::Execute { graph_file, context_file }) => {
      execute_from_disk(graph_file, context_file, cli.config).await
    }
    Some(Commands::Demo) => run_demo().await,
    None => {
      println!("gaff - use --help to see available commands");
      Ok(())
    }
  }
}

async fn execute_from_disk(graph_file: PathBuf, context_file: Option<PathBuf>, config_flag: Option<PathBuf>) -> Result<()> {
  let graph = load_graph(&graph_file).await?;
  let context = match context_file {
    Some(path) => load_context(&path).await?,
    None => HashMap::new(),
  };

  let catalog_path = config_flag
    .or_else(|| std::env::var_os("GAFF_CONFIG_PATH").map(PathBuf::from))
    .context("no agent catalog configured: pass --config or set GAFF_CONFIG_PATH")?;
  let registry = AgentCatalog::load(&catalog_path)
    .await
    .with_context(|| format!("failed to load agent catalog: {}", catalog_path.display()))?;

  let coordinator = Coordinator::new(
    Arc::new(registry),
    Arc::new(HttpInvoker::default()),
    Arc::new(InMemoryStore::new()),
  );

  let outcome = coordinator
    .execute(graph, context, CoordinatorConfig::default())
    .await
    .context("execution failed")?;

  print_outcome(&outcome)
}

async fn load_graph(path: &PathBuf) -> Result<IntentGraph> {
  let content = tokio::fs::read_to_string(path)
    .await
    .with_context(|| format!("failed to read intent graph file: {}", path.display()))?;
  serde_json::from_str(&content).with_context(|| format!("failed to parse intent graph file: {}", path.display()))
}

async fn load_context(path: &PathBuf) -> Result<HashMap<String, Value>> {
  let content = tokio::fs::read_to_string(path)
    .await
    .with_context(|| format!("failed to read context file: {}", path.display()))?;
  serde_json::from_str(&content).with_context(|| format!("failed to parse context file: {}", path.display()))
}

fn print_outcome(outcome: &ExecutionOutcome) -> Result<()> {
  match outcome {
    ExecutionOutcome::Settled(settled) => {
      eprintln!("execution {} settled as {:?}", settled.execution_id, settled.status);
      eprintln!("nodes executed: {}, nodes failed: {}", settled.nodes_executed, settled.nodes_failed);
    }
    ExecutionOutcome::Paused(paused) => {
      eprintln!("execution {} paused at node {}", paused.execution_id, paused.paused_at_node);
      eprintln!("{}", paused.resume_instructions);
    }
  }
  println!("{}", serde_json::to_string_pretty(outcome)?);
  Ok(())
}

/// A linear three-node scenario (A→B→C): A returns `{x: 1}`, B's
/// input resolves `${A.x}` and returns `{y: 2}`, C's input resolves `${B.y}`.
/// Runs entirely in-process: a mock invoker, an in-memory store, no
/// network, no catalog file.
async fn run_demo() -> Result<()> {
  let graph = demo_graph();
  let registry = AgentCatalog::new(vec![demo_agent()]).context("failed to build demo agent catalog")?;
  let invoker: Arc<dyn AgentInvoker> = Arc::new(MockInvoker::new().on("demo-agent", "call", demo_agent_handler));
  let coordinator = Coordinator::new(
    Arc::new(registry) as Arc<dyn AgentRegistry>,
    invoker,
    Arc::new(InMemoryStore::new()) as Arc<dyn StateStore>,
  );

  let outcome = coordinator
    .execute(graph, HashMap::new(), CoordinatorConfig::default())
    .await
    .context("demo execution failed")?;

  print_outcome(&outcome)
}

/// Branches on which upstream field is present so the same mock handler
/// can stand in for all three demo nodes: A sees an empty input and
/// returns `{x: 1}`; B sees `from_a` and returns `{y: 2}`; C sees `from_b`
/// and echoes it back as its own resolved input had nothing further to
/// produce.
fn demo_agent_handler(input: Value) -> Result<Value, gaff_dispatcher::InvokeError> {
  let input = input.as_object().cloned().unwrap_or_default();
  if input.contains_key("from_b") {
    Ok(serde_json::json!({"z": input.get("from_b").cloned().unwrap_or(Value::Null)}))
  } else if input.contains_key("from_a") {
    Ok(serde_json::json!({"y": 2}))
  } else {
    Ok(serde_json::json!({"x": 1}))
  }
}

fn demo_agent() -> Agent {
  Agent {
    name: "demo-agent".to_string(),
    agent_type: "mock".to_string(),
    description: "in-process demo agent".to_string(),
    capabilities: vec![],
    endpoint: None,
    auth: AuthMode::None,
    timeout_ms: None,
    retry_policy: RetryPolicy::default(),
    input_schema: serde_json::json!({}),
    output_schema: serde_json::json!({}),
  }
}

fn demo_node(id: &str, inputs: HashMap<String, Value>) -> Node {
  Node {
    node_id: id.to_string(),
    agent: "demo-agent".to_string(),
    tool: "call".to_string(),
    node_type: NodeType::Processing,
    purpose: None,
    instructions: None,
    inputs,
    outputs: Vec::<OutputDecl>::new(),
    timeout_ms: None,
    retry_policy: None,
    dependencies: Vec::new(),
    metadata: HashMap::new(),
  }
}

fn demo_graph() -> IntentGraph {
  let a = demo_node("A", HashMap::new());

  let mut b_inputs = HashMap::new();
  b_inputs.insert("from_a".to_string(), serde_json::json!("${A.x}"));
  let b = demo_node("B", b_inputs);

  let mut c_inputs = HashMap::new();
  c_inputs.insert("from_b".to_string(), serde_json::json!("${B.y}"));
  let c = demo_node("C", c_inputs);

  IntentGraph {
    nodes: vec![a, b, c],
    edges: vec![Edge::new("A", "B"), Edge::new("B", "C")],
    execution_plan: ExecutionPlan {
      entry_points: vec!["A".to_string()],
      exit_points: vec!["C".to_string()],
      strategy: ExecutionStrategy::Sequential,
    },
  }
}
