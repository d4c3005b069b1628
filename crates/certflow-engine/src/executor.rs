use std::collections::HashMap;

use async_trait::async_trait;
use certflow_workflow::WorkflowNode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::NodeExecutionError;

/// A single timestamped line of output produced while executing a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputEvent {
  pub time: DateTime<Utc>,
  pub content: String,
}

impl OutputEvent {
  pub fn now(content: impl Into<String>) -> Self {
    Self {
      time: Utc::now(),
      content: content.into(),
    }
  }
}

/// Mutable state threaded through one run.
///
/// Executors publish artifacts here (an apply node records its issued
/// certificate) and downstream executors look them up by the same
/// `"nodeId#output"` reference the validated configuration carries.
#[derive(Debug, Default)]
pub struct RunContext {
  artifacts: HashMap<String, serde_json::Value>,
}

impl RunContext {
  pub fn new() -> Self {
    Self::default()
  }

  /// Record an artifact under `"{node_id}#{output}"`.
  pub fn record_artifact(&mut self, node_id: &str, output: &str, value: serde_json::Value) {
    self.artifacts.insert(format!("{node_id}#{output}"), value);
  }

  /// Look up an artifact by its `"nodeId#output"` reference.
  pub fn artifact(&self, reference: &str) -> Option<&serde_json::Value> {
    self.artifacts.get(reference)
  }
}

/// The contract the run loop calls to execute one node.
///
/// Implemented externally per node kind; this is the only seam through which
/// provider-specific issuance, DNS and deployment logic is reached. The core
/// imposes no timeout; timeout policy belongs to implementations.
#[async_trait]
pub trait NodeExecutor: Send + Sync {
  /// Execute one node given the upstream context, producing its output
  /// lines in emission order. Called once per node in traversal order along
  /// the selected path.
  async fn execute(
    &self,
    node: &WorkflowNode,
    ctx: &mut RunContext,
  ) -> Result<Vec<OutputEvent>, NodeExecutionError>;

  /// For a branch node: the index of the single branch to continue down.
  async fn select_branch(
    &self,
    node: &WorkflowNode,
    ctx: &RunContext,
  ) -> Result<usize, NodeExecutionError>;
}
