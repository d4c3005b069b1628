use chrono::{DateTime, Utc};
use thiserror::Error;

/// Failure of a single node, reported by a [`crate::NodeExecutor`]
/// implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct NodeExecutionError {
  pub time: DateTime<Utc>,
  pub message: String,
}

impl NodeExecutionError {
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      time: Utc::now(),
      message: message.into(),
    }
  }
}

/// Terminal failure of a workflow run.
///
/// Recorded on the run record; never affects the published graph or other
/// runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
  #[error("run cancelled")]
  Cancelled,

  #[error("workflow '{0}' is not enabled")]
  Disabled(String),

  #[error("workflow '{0}' has never been published")]
  NotPublished(String),

  #[error("invalid graph: {message}")]
  InvalidGraph { message: String },

  #[error("node '{node_id}' failed: {source}")]
  Node {
    node_id: String,
    source: NodeExecutionError,
  },

  #[error("node '{node_id}' selected branch {selected}, but only {available} exist")]
  BranchOutOfRange {
    node_id: String,
    selected: usize,
    available: usize,
  },
}
