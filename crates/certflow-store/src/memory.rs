use std::collections::HashMap;

use async_trait::async_trait;
use certflow_workflow::Workflow;
use tokio::sync::RwLock;

use crate::types::WorkflowRun;
use crate::{Error, Store};

/// In-memory [`Store`] backed by `tokio` read-write locks.
///
/// Suitable for tests and single-process deployments; a database-backed
/// implementation plugs in behind the same trait.
#[derive(Debug, Default)]
pub struct MemoryStore {
  workflows: RwLock<HashMap<String, Workflow>>,
  runs: RwLock<HashMap<String, WorkflowRun>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

#[async_trait]
impl Store for MemoryStore {
  async fn put_workflow(&self, workflow: &Workflow) -> Result<(), Error> {
    self
      .workflows
      .write()
      .await
      .insert(workflow.id.clone(), workflow.clone());
    Ok(())
  }

  async fn get_workflow(&self, workflow_id: &str) -> Result<Workflow, Error> {
    self
      .workflows
      .read()
      .await
      .get(workflow_id)
      .cloned()
      .ok_or_else(|| Error::NotFound(workflow_id.to_string()))
  }

  async fn list_workflows(&self) -> Result<Vec<Workflow>, Error> {
    let mut workflows: Vec<Workflow> = self.workflows.read().await.values().cloned().collect();
    workflows.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(workflows)
  }

  async fn create_run(&self, run: &WorkflowRun) -> Result<(), Error> {
    self.runs.write().await.insert(run.id.clone(), run.clone());
    Ok(())
  }

  async fn update_run(&self, run: &WorkflowRun) -> Result<(), Error> {
    let mut runs = self.runs.write().await;
    let existing = runs
      .get(&run.id)
      .ok_or_else(|| Error::NotFound(run.id.clone()))?;
    if existing.is_complete() {
      return Err(Error::RunComplete(run.id.clone()));
    }
    runs.insert(run.id.clone(), run.clone());
    Ok(())
  }

  async fn get_run(&self, run_id: &str) -> Result<WorkflowRun, Error> {
    self
      .runs
      .read()
      .await
      .get(run_id)
      .cloned()
      .ok_or_else(|| Error::NotFound(run_id.to_string()))
  }

  async fn list_runs(&self, workflow_id: &str) -> Result<Vec<WorkflowRun>, Error> {
    let mut runs: Vec<WorkflowRun> = self
      .runs
      .read()
      .await
      .values()
      .filter(|run| run.workflow_id == workflow_id)
      .cloned()
      .collect();
    runs.sort_by(|a, b| b.started_at.cmp(&a.started_at));
    Ok(runs)
  }
}
