use certflow_workflow::GraphError;
use thiserror::Error;

/// Errors from lifecycle operations.
///
/// `Validation` is recoverable and names the offending node for inline
/// display; `Structural` indicates corrupted persisted state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
  #[error("validation failed at node '{node_id}': {reason}")]
  Validation { node_id: String, reason: String },

  #[error("structural error: {0}")]
  Structural(#[from] GraphError),

  #[error("workflow has no draft to commit")]
  NoDraft,

  #[error("workflow has never been published")]
  NotPublished,
}
