use serde::{Deserialize, Serialize};

use crate::chain::Chain;

/// The workflow aggregate: metadata plus two independently owned chain
/// snapshots.
///
/// `draft` is mutated freely by editing; `published` is replaced only by a
/// successful commit and is what runs execute against. The two never alias
/// nodes, so draft edits cannot affect an in-flight run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
  pub id: String,
  pub name: String,
  #[serde(default)]
  pub description: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub draft: Option<Chain>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub published: Option<Chain>,
  #[serde(default)]
  pub enabled: bool,
}

impl Workflow {
  /// Create a workflow with a fresh id and no chains.
  pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
    Self {
      id: uuid::Uuid::new_v4().to_string(),
      name: name.into(),
      description: description.into(),
      draft: None,
      published: None,
      enabled: false,
    }
  }

  /// Whether the draft differs from the published chain, structurally or by
  /// content. Computed, never stored.
  pub fn has_draft(&self) -> bool {
    match (&self.draft, &self.published) {
      (None, _) => false,
      (Some(_), None) => true,
      (Some(draft), Some(published)) => !draft.structurally_equal(published),
    }
  }
}
