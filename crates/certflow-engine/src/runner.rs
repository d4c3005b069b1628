use std::sync::Arc;

use certflow_store::{RunStatus, WorkflowRun};
use certflow_workflow::{Chain, NodeKind, Workflow};
use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use crate::error::ExecutionError;
use crate::executor::{NodeExecutor, RunContext};
use crate::reduce::{EventBody, NodeEvent, reduce};

/// Drives one run at a time over a published chain snapshot.
///
/// Nodes along the selected path are causally dependent (a deploy node
/// consumes an upstream certificate), so execution within a run is
/// sequential. Independent runs share nothing mutable and may proceed fully
/// in parallel, each over its own snapshot.
pub struct WorkflowRunner {
  executor: Arc<dyn NodeExecutor>,
}

impl WorkflowRunner {
  pub fn new(executor: Arc<dyn NodeExecutor>) -> Self {
    Self { executor }
  }

  /// Run a workflow's published chain.
  ///
  /// The chain is cloned up front: concurrent commits never affect this run.
  /// Fails without producing a run record only when the workflow cannot run
  /// at all (disabled, or never published).
  pub async fn run_published(
    &self,
    workflow: &Workflow,
    cancel: CancellationToken,
  ) -> Result<WorkflowRun, ExecutionError> {
    if !workflow.enabled {
      return Err(ExecutionError::Disabled(workflow.id.clone()));
    }
    let snapshot = workflow
      .published
      .clone()
      .ok_or_else(|| ExecutionError::NotPublished(workflow.id.clone()))?;
    Ok(self.run(&workflow.id, &snapshot, cancel).await)
  }

  /// Execute one chain snapshot to completion, producing the run record.
  ///
  /// Node failure and cancellation are recorded on the run, not returned:
  /// the record carries `status`, `error` and the logs of the nodes that
  /// ran before the failure.
  #[instrument(name = "workflow_run", skip(self, chain, cancel), fields(workflow_id = %workflow_id))]
  pub async fn run(
    &self,
    workflow_id: &str,
    chain: &Chain,
    cancel: CancellationToken,
  ) -> WorkflowRun {
    let run_id = uuid::Uuid::new_v4().to_string();
    let started_at = Utc::now();
    info!(run_id = %run_id, "run started");

    let mut events: Vec<NodeEvent> = Vec::new();
    let outcome = self.walk(chain, &mut events, &cancel).await;

    let logs = reduce(&events);
    let (status, error) = match outcome {
      Ok(()) => {
        info!(run_id = %run_id, nodes = logs.len(), "run succeeded");
        (RunStatus::Succeeded, None)
      }
      Err(e) => {
        error!(run_id = %run_id, error = %e, "run failed");
        (RunStatus::Failed, Some(e.to_string()))
      }
    };

    WorkflowRun {
      id: run_id,
      workflow_id: workflow_id.to_string(),
      status,
      started_at,
      completed_at: Some(Utc::now()),
      error,
      logs,
    }
  }

  /// Walk the selected path, calling the executor once per node.
  async fn walk(
    &self,
    chain: &Chain,
    events: &mut Vec<NodeEvent>,
    cancel: &CancellationToken,
  ) -> Result<(), ExecutionError> {
    chain
      .check_structure()
      .map_err(|e| ExecutionError::InvalidGraph {
        message: e.to_string(),
      })?;

    let mut ctx = RunContext::new();
    // Trunk positions to resume at after a branch sub-chain ends.
    let mut continuations: Vec<String> = Vec::new();
    let mut current: Option<String> = chain.entry().map(str::to_string);

    loop {
      let Some(id) = current.take().or_else(|| continuations.pop()) else {
        return Ok(());
      };
      // A cancellation request takes effect once the in-flight node call
      // has returned, before the next one is issued.
      if cancel.is_cancelled() {
        warn!(node_id = %id, "run cancelled before node");
        return Err(ExecutionError::Cancelled);
      }
      let node = chain.get(&id).ok_or_else(|| ExecutionError::InvalidGraph {
        message: format!("node '{id}' not present in snapshot"),
      })?;

      match node.kind {
        NodeKind::Branch => {
          let selected = self
            .executor
            .select_branch(node, &ctx)
            .await
            .map_err(|e| ExecutionError::Node {
              node_id: id.clone(),
              source: e,
            })?;
          let Some(head) = node.branches.get(selected) else {
            return Err(ExecutionError::BranchOutOfRange {
              node_id: id.clone(),
              selected,
              available: node.branches.len(),
            });
          };
          info!(node_id = %id, branch = selected, "branch selected");
          if let Some(next) = &node.next {
            continuations.push(next.clone());
          }
          current = Some(head.clone());
        }
        _ => {
          let outputs = self
            .executor
            .execute(node, &mut ctx)
            .await
            .map_err(|e| ExecutionError::Node {
              node_id: id.clone(),
              source: e,
            })?;
          events.extend(outputs.into_iter().map(|output| NodeEvent {
            node_id: node.id.clone(),
            node_name: node.name.clone(),
            event: EventBody::Output {
              time: output.time,
              content: output.content,
            },
          }));
          current = node.next.clone();
        }
      }
    }
  }
}
