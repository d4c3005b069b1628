//! Certflow Store
//!
//! This crate provides the storage trait and implementations for workflow
//! records and run history. The concrete encoding is an external concern;
//! the [`Store`] trait only requires that workflows round-trip losslessly
//! and that a run's log entries preserve emission order.
//!
//! The [`Store`] trait defines operations for:
//! - Saving and loading workflow records (draft and published chains)
//! - Recording workflow runs and their logs
//! - Querying run history

mod memory;
mod types;

pub use memory::MemoryStore;
pub use types::{LogLine, NodeLogEntry, RunStatus, WorkflowRun};

use async_trait::async_trait;
use certflow_workflow::Workflow;

/// Error type for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
  /// The requested record was not found.
  #[error("not found: {0}")]
  NotFound(String),

  /// A completed run was updated. Runs are immutable once terminal.
  #[error("run '{0}' is already complete")]
  RunComplete(String),
}

/// Storage trait for workflow records and run history.
#[async_trait]
pub trait Store: Send + Sync {
  /// Insert or replace a workflow record.
  async fn put_workflow(&self, workflow: &Workflow) -> Result<(), Error>;

  /// Get a workflow by id.
  async fn get_workflow(&self, workflow_id: &str) -> Result<Workflow, Error>;

  /// List all workflows.
  async fn list_workflows(&self) -> Result<Vec<Workflow>, Error>;

  /// Record a new run.
  async fn create_run(&self, run: &WorkflowRun) -> Result<(), Error>;

  /// Replace a run record, e.g. when it completes. Fails with
  /// [`Error::RunComplete`] if the stored run is already terminal.
  async fn update_run(&self, run: &WorkflowRun) -> Result<(), Error>;

  /// Get a run by id.
  async fn get_run(&self, run_id: &str) -> Result<WorkflowRun, Error>;

  /// List runs for a workflow, most recent first.
  async fn list_runs(&self, workflow_id: &str) -> Result<Vec<WorkflowRun>, Error>;
}
