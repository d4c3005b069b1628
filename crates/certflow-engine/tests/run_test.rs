//! Run loop tests: sequential execution, branch selection, cancellation and
//! partial-failure log truncation.

use std::sync::Arc;

use async_trait::async_trait;
use certflow_engine::{
  ExecutionError, NodeExecutionError, NodeExecutor, OutputEvent, RunContext, WorkflowRunner,
};
use certflow_store::RunStatus;
use certflow_workflow::{Chain, NodeKind, Workflow, WorkflowNode};
use serde_json::json;
use tokio_util::sync::CancellationToken;

/// Deterministic executor: one output line per node, a configurable failing
/// node, and a fixed branch choice. Apply nodes publish a fake certificate
/// artifact; deploy nodes consume it through their configured reference.
struct ScriptedExecutor {
  fail_on: Option<String>,
  branch_choice: usize,
}

impl ScriptedExecutor {
  fn ok() -> Self {
    Self {
      fail_on: None,
      branch_choice: 0,
    }
  }

  fn failing_at(node_id: &str) -> Self {
    Self {
      fail_on: Some(node_id.to_string()),
      branch_choice: 0,
    }
  }

  fn choosing(branch_choice: usize) -> Self {
    Self {
      fail_on: None,
      branch_choice,
    }
  }
}

#[async_trait]
impl NodeExecutor for ScriptedExecutor {
  async fn execute(
    &self,
    node: &WorkflowNode,
    ctx: &mut RunContext,
  ) -> Result<Vec<OutputEvent>, NodeExecutionError> {
    if self.fail_on.as_deref() == Some(node.id.as_str()) {
      return Err(NodeExecutionError::new("provider unreachable"));
    }
    match node.kind {
      NodeKind::Apply => {
        ctx.record_artifact(&node.id, "certificate", json!("PEM"));
        Ok(vec![OutputEvent::now("certificate issued")])
      }
      NodeKind::Deploy => {
        let reference = node
          .config
          .get("certificate")
          .and_then(|v| v.as_str())
          .unwrap_or_default();
        let cert = ctx
          .artifact(reference)
          .cloned()
          .ok_or_else(|| NodeExecutionError::new(format!("no artifact at '{reference}'")))?;
        Ok(vec![OutputEvent::now(format!("deployed {cert}"))])
      }
      _ => Ok(vec![OutputEvent::now(format!("{} done", node.name))]),
    }
  }

  async fn select_branch(
    &self,
    _node: &WorkflowNode,
    _ctx: &RunContext,
  ) -> Result<usize, NodeExecutionError> {
    Ok(self.branch_choice)
  }
}

fn runner(executor: ScriptedExecutor) -> WorkflowRunner {
  WorkflowRunner::new(Arc::new(executor))
}

/// trigger -> apply -> deploy -> notify -> end (five nodes).
fn five_node_chain() -> (Chain, Vec<String>) {
  let mut chain = Chain::with_trigger();
  let trigger = chain.entry().unwrap().to_string();
  let apply = chain
    .insert_after(&trigger, WorkflowNode::new(NodeKind::Apply))
    .unwrap();
  let mut deploy_node = WorkflowNode::new(NodeKind::Deploy);
  deploy_node
    .config
    .insert("certificate".to_string(), json!(format!("{apply}#certificate")));
  let deploy = chain.insert_after(&apply, deploy_node).unwrap();
  let notify = chain
    .insert_after(&deploy, WorkflowNode::new(NodeKind::Notify))
    .unwrap();
  let end = chain
    .insert_after(&notify, WorkflowNode::new(NodeKind::End))
    .unwrap();
  (chain, vec![trigger, apply, deploy, notify, end])
}

/// trigger -> branch { [apply -> deploy], [notify] } -> end
fn branching_chain() -> (Chain, Vec<String>) {
  let mut chain = Chain::with_trigger();
  let trigger = chain.entry().unwrap().to_string();
  let branch = chain
    .insert_after(&trigger, WorkflowNode::new(NodeKind::Branch))
    .unwrap();
  let end = chain
    .insert_after(&branch, WorkflowNode::new(NodeKind::End))
    .unwrap();
  let apply = chain
    .append_branch(&branch, WorkflowNode::new(NodeKind::Apply))
    .unwrap();
  let mut deploy_node = WorkflowNode::new(NodeKind::Deploy);
  deploy_node
    .config
    .insert("certificate".to_string(), json!(format!("{apply}#certificate")));
  let deploy = chain.insert_after(&apply, deploy_node).unwrap();
  let notify = chain
    .append_branch(&branch, WorkflowNode::new(NodeKind::Notify))
    .unwrap();
  (chain, vec![trigger, branch, end, apply, deploy, notify])
}

#[tokio::test]
async fn successful_run_logs_every_executed_node_in_order() {
  let (chain, ids) = five_node_chain();
  let run = runner(ScriptedExecutor::ok())
    .run("wf-1", &chain, CancellationToken::new())
    .await;

  assert_eq!(run.status, RunStatus::Succeeded);
  assert_eq!(run.error, None);
  assert!(run.completed_at.is_some());

  let logged: Vec<&str> = run.logs.iter().map(|e| e.node_id.as_str()).collect();
  let expected: Vec<&str> = ids.iter().map(String::as_str).collect();
  assert_eq!(logged, expected);
}

#[tokio::test]
async fn failure_at_third_node_leaves_two_log_entries() {
  let (chain, ids) = five_node_chain();
  let deploy_id = &ids[2];
  let run = runner(ScriptedExecutor::failing_at(deploy_id))
    .run("wf-1", &chain, CancellationToken::new())
    .await;

  assert_eq!(run.status, RunStatus::Failed);
  let error = run.error.unwrap();
  assert!(error.contains("provider unreachable"), "{error}");

  // Only the two nodes that ran before the failure are materialized.
  assert_eq!(run.logs.len(), 2);
  assert_eq!(run.logs[0].node_id, ids[0]);
  assert_eq!(run.logs[1].node_id, ids[1]);
}

#[tokio::test]
async fn cancellation_is_recorded_as_a_failed_run() {
  let (chain, _) = five_node_chain();
  let cancel = CancellationToken::new();
  cancel.cancel();

  let run = runner(ScriptedExecutor::ok()).run("wf-1", &chain, cancel).await;

  assert_eq!(run.status, RunStatus::Failed);
  assert_eq!(run.error.as_deref(), Some("run cancelled"));
  assert!(run.logs.is_empty());
}

#[tokio::test]
async fn branch_runs_exactly_one_subchain_then_continues() {
  let (chain, ids) = branching_chain();
  let [_, _, end, apply, deploy, notify] = &ids[..] else {
    unreachable!()
  };

  // First branch: apply -> deploy, then the trunk's end node.
  let run = runner(ScriptedExecutor::choosing(0))
    .run("wf-1", &chain, CancellationToken::new())
    .await;
  assert_eq!(run.status, RunStatus::Succeeded);
  let logged: Vec<&str> = run.logs.iter().map(|e| e.node_id.as_str()).collect();
  assert!(logged.contains(&apply.as_str()));
  assert!(logged.contains(&deploy.as_str()));
  assert!(!logged.contains(&notify.as_str()));
  assert_eq!(logged.last(), Some(&end.as_str()));

  // Second branch: only the notify node, never the sibling chain.
  let run = runner(ScriptedExecutor::choosing(1))
    .run("wf-1", &chain, CancellationToken::new())
    .await;
  assert_eq!(run.status, RunStatus::Succeeded);
  let logged: Vec<&str> = run.logs.iter().map(|e| e.node_id.as_str()).collect();
  assert!(logged.contains(&notify.as_str()));
  assert!(!logged.contains(&apply.as_str()));
  assert!(!logged.contains(&deploy.as_str()));
}

#[tokio::test]
async fn out_of_range_branch_selection_fails_the_run() {
  let (chain, _) = branching_chain();
  let run = runner(ScriptedExecutor::choosing(7))
    .run("wf-1", &chain, CancellationToken::new())
    .await;

  assert_eq!(run.status, RunStatus::Failed);
  assert!(run.error.unwrap().contains("branch"));
}

#[tokio::test]
async fn artifacts_flow_from_apply_to_deploy() {
  let (chain, ids) = five_node_chain();
  let run = runner(ScriptedExecutor::ok())
    .run("wf-1", &chain, CancellationToken::new())
    .await;

  let deploy_entry = run.logs.iter().find(|e| e.node_id == ids[2]).unwrap();
  assert!(deploy_entry.outputs[0].content.contains("PEM"));
}

#[tokio::test]
async fn run_published_requires_an_enabled_published_workflow() {
  let (chain, _) = five_node_chain();
  let mut workflow = Workflow::new("renewal", "");
  let r = runner(ScriptedExecutor::ok());

  let result = r.run_published(&workflow, CancellationToken::new()).await;
  assert!(matches!(result, Err(ExecutionError::Disabled(_))));

  workflow.enabled = true;
  let result = r.run_published(&workflow, CancellationToken::new()).await;
  assert!(matches!(result, Err(ExecutionError::NotPublished(_))));

  workflow.published = Some(chain);
  let run = r
    .run_published(&workflow, CancellationToken::new())
    .await
    .unwrap();
  assert_eq!(run.status, RunStatus::Succeeded);
  assert_eq!(run.workflow_id, workflow.id);
}
