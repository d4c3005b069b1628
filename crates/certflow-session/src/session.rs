use certflow_engine::validate;
use certflow_workflow::{Chain, GraphError, Workflow};
use tokio::sync::Mutex;
use tracing::info;

use crate::error::SessionError;

/// Derived lifecycle state of a workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
  /// No draft, nothing published.
  Empty,
  /// A draft exists but nothing has been published yet.
  Drafting,
  /// A published chain exists; a differing draft may too.
  Published,
  /// Published and enabled: runs may start.
  Active,
}

/// An explicit per-workflow session: the single entry point for editing,
/// committing and enabling one workflow.
///
/// All operations take the session's mutex, which serializes them against
/// each other. Published snapshots handed out for execution are deep clones,
/// so later edits and commits never touch an in-flight run.
pub struct WorkflowSession {
  inner: Mutex<Workflow>,
}

impl WorkflowSession {
  pub fn new(workflow: Workflow) -> Self {
    Self {
      inner: Mutex::new(workflow),
    }
  }

  /// Consume the session, returning the workflow record for persistence.
  pub fn into_workflow(self) -> Workflow {
    self.inner.into_inner()
  }

  /// A copy of the current workflow record.
  pub async fn workflow(&self) -> Workflow {
    self.inner.lock().await.clone()
  }

  pub async fn state(&self) -> LifecycleState {
    let wf = self.inner.lock().await;
    match (&wf.published, &wf.draft, wf.enabled) {
      (Some(_), _, true) => LifecycleState::Active,
      (Some(_), _, false) => LifecycleState::Published,
      (None, Some(_), _) => LifecycleState::Drafting,
      (None, None, _) => LifecycleState::Empty,
    }
  }

  /// Whether the draft differs from the published chain.
  pub async fn has_draft(&self) -> bool {
    self.inner.lock().await.has_draft()
  }

  /// Mutate the draft chain. Seeds the draft from the published chain (or a
  /// fresh trigger-only chain) if none exists yet. Only the draft is ever
  /// touched; the published chain and enabled flag are unaffected.
  pub async fn edit<F, R>(&self, f: F) -> R
  where
    F: FnOnce(&mut Chain) -> R,
  {
    let mut wf = self.inner.lock().await;
    if wf.draft.is_none() {
      let seed = match &wf.published {
        Some(published) => published.clone(),
        None => Chain::with_trigger(),
      };
      wf.draft = Some(seed);
    }
    // Seeded just above.
    f(wf.draft.as_mut().unwrap())
  }

  /// Promote the draft to published.
  ///
  /// The draft must pass full validation; on failure the error names the
  /// first invalid node and nothing changes. On success the published chain
  /// becomes a deep copy of the draft, so further draft edits cannot reach
  /// it.
  pub async fn commit(&self) -> Result<(), SessionError> {
    let mut wf = self.inner.lock().await;
    let draft = wf.draft.as_ref().ok_or(SessionError::NoDraft)?;

    if draft.is_empty() {
      return Err(SessionError::Structural(GraphError::EmptyChain));
    }
    let report = validate(draft);
    if !report.valid {
      return Err(match report.first_invalid {
        Some(invalid) => SessionError::Validation {
          node_id: invalid.node_id,
          reason: invalid.reason,
        },
        None => SessionError::Structural(GraphError::EmptyChain),
      });
    }
    draft.check_structure()?;

    let published = draft.clone();
    let nodes = published.len();
    wf.published = Some(published);
    info!(workflow_id = %wf.id, nodes, "draft committed");
    Ok(())
  }

  /// Enable or disable the workflow.
  ///
  /// Enabling validates the **published** chain only: an invalid draft never
  /// blocks a previously published, valid workflow, and an invalid published
  /// chain can never be activated. Disabling always succeeds.
  pub async fn set_enabled(&self, enabled: bool) -> Result<(), SessionError> {
    let mut wf = self.inner.lock().await;
    if !enabled {
      wf.enabled = false;
      info!(workflow_id = %wf.id, "workflow disabled");
      return Ok(());
    }

    let published = wf.published.as_ref().ok_or(SessionError::NotPublished)?;
    if published.is_empty() {
      return Err(SessionError::Structural(GraphError::EmptyChain));
    }
    let report = validate(published);
    if let Some(invalid) = report.first_invalid {
      return Err(SessionError::Validation {
        node_id: invalid.node_id,
        reason: invalid.reason,
      });
    }
    published.check_structure()?;

    wf.enabled = true;
    info!(workflow_id = %wf.id, "workflow enabled");
    Ok(())
  }

  /// A deep copy of the published chain, for handing to the run loop.
  pub async fn published_snapshot(&self) -> Option<Chain> {
    self.inner.lock().await.published.clone()
  }
}
