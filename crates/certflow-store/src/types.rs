use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of a workflow run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
  Running,
  Succeeded,
  Failed,
}

/// One timestamped line a node emitted, or the error that ended it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogLine {
  pub time: DateTime<Utc>,
  #[serde(default)]
  pub content: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
}

/// The aggregated log of one node within a run: its lines in emission order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeLogEntry {
  pub node_id: String,
  pub node_name: String,
  pub outputs: Vec<LogLine>,
}

/// One execution of a workflow's published chain.
///
/// Immutable once `status` leaves `Running`; log entries preserve emission
/// order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowRun {
  pub id: String,
  pub workflow_id: String,
  pub status: RunStatus,
  pub started_at: DateTime<Utc>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub completed_at: Option<DateTime<Utc>>,
  /// Top-level failure message; set iff `status` is `Failed`.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
  #[serde(default)]
  pub logs: Vec<NodeLogEntry>,
}

impl WorkflowRun {
  pub fn is_complete(&self) -> bool {
    self.status != RunStatus::Running
  }
}
