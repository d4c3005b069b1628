use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use certflow_engine::{
  NodeExecutionError, NodeExecutor, OutputEvent, RunContext, WorkflowRunner, validate,
};
use certflow_workflow::{Chain, NodeKind, Workflow, WorkflowNode};

/// certflow - certificate issuance and deployment workflows
#[derive(Parser)]
#[command(name = "certflow")]
#[command(version, about, long_about = None)]
struct Cli {
  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Validate a workflow file's draft (or published) chain
  Validate {
    /// Path to the workflow file (JSON)
    workflow_file: PathBuf,
  },

  /// Dry-run a workflow file: walk the chain without touching any provider
  Run {
    /// Path to the workflow file (JSON)
    workflow_file: PathBuf,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  match cli.command {
    Some(Commands::Validate { workflow_file }) => validate_file(workflow_file),
    Some(Commands::Run { workflow_file }) => {
      let rt = tokio::runtime::Runtime::new()?;
      rt.block_on(async { run_file(workflow_file).await })
    }
    None => {
      println!("certflow - use --help to see available commands");
      Ok(())
    }
  }
}

fn load_workflow(workflow_file: &PathBuf) -> Result<Workflow> {
  let content = std::fs::read_to_string(workflow_file)
    .with_context(|| format!("failed to read workflow file: {}", workflow_file.display()))?;
  serde_json::from_str(&content)
    .with_context(|| format!("failed to parse workflow file: {}", workflow_file.display()))
}

/// The chain a local command operates on: the draft when one exists,
/// otherwise the published chain.
fn working_chain(workflow: &Workflow) -> Result<&Chain> {
  workflow
    .draft
    .as_ref()
    .or(workflow.published.as_ref())
    .context("workflow has neither a draft nor a published chain")
}

fn validate_file(workflow_file: PathBuf) -> Result<()> {
  let workflow = load_workflow(&workflow_file)?;
  let chain = working_chain(&workflow)?;

  chain.check_structure().context("chain is malformed")?;
  let report = validate(chain);
  match report.first_invalid {
    None if report.valid => {
      eprintln!("workflow '{}' is valid ({} nodes)", workflow.name, chain.len());
      Ok(())
    }
    None => bail!("workflow '{}' has an empty chain", workflow.name),
    Some(invalid) => bail!(
      "workflow '{}' is invalid at node '{}': {}",
      workflow.name,
      invalid.node_id,
      invalid.reason
    ),
  }
}

async fn run_file(workflow_file: PathBuf) -> Result<()> {
  let workflow = load_workflow(&workflow_file)?;
  let chain = working_chain(&workflow)?.clone();

  eprintln!("loaded workflow: {} ({} nodes)", workflow.name, chain.len());

  let runner = WorkflowRunner::new(std::sync::Arc::new(DryRunExecutor));
  let cancel = CancellationToken::new();
  let run = runner.run(&workflow.id, &chain, cancel).await;

  eprintln!("run {} finished: {:?}", run.id, run.status);
  println!("{}", serde_json::to_string_pretty(&run)?);

  if let Some(error) = &run.error {
    bail!("run failed: {error}");
  }
  Ok(())
}

/// Executor for local dry-runs: emits one line per node and fakes the
/// artifacts a real provider integration would produce. Branch nodes always
/// take their first sub-chain.
struct DryRunExecutor;

#[async_trait]
impl NodeExecutor for DryRunExecutor {
  async fn execute(
    &self,
    node: &WorkflowNode,
    ctx: &mut RunContext,
  ) -> Result<Vec<OutputEvent>, NodeExecutionError> {
    if node.kind == NodeKind::Apply {
      for output in &node.outputs {
        ctx.record_artifact(&node.id, output, serde_json::json!("<dry-run>"));
      }
    }
    Ok(vec![OutputEvent::now(format!(
      "dry-run: {} ({:?})",
      node.name, node.kind
    ))])
  }

  async fn select_branch(
    &self,
    _node: &WorkflowNode,
    _ctx: &RunContext,
  ) -> Result<usize, NodeExecutionError> {
    Ok(0)
  }
}
