use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The output name an apply node declares for its issued certificate.
///
/// Downstream deploy nodes reference it as `"<nodeId>#certificate"`.
pub const OUTPUT_CERTIFICATE: &str = "certificate";

/// Configuration record for a single node.
///
/// A string-keyed mapping whose shape is defined by the registry schema for
/// the node's kind. The graph model treats it as opaque.
pub type NodeConfig = Map<String, Value>;

/// The kind of a workflow node, fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
  /// Starts the workflow (manual or scheduled).
  Trigger,
  /// Applies for a certificate; declares the `certificate` output.
  Apply,
  /// Owns alternative sub-chains; exactly one executes per run.
  Branch,
  /// Deploys an upstream certificate to a provider resource.
  Deploy,
  /// Sends a notification.
  Notify,
  /// Marks the end of a chain.
  End,
}

impl NodeKind {
  /// Default display name for newly created nodes of this kind.
  pub fn default_name(&self) -> &'static str {
    match self {
      NodeKind::Trigger => "Trigger",
      NodeKind::Apply => "Apply Certificate",
      NodeKind::Branch => "Branch",
      NodeKind::Deploy => "Deploy",
      NodeKind::Notify => "Notify",
      NodeKind::End => "End",
    }
  }

  /// Output names a node of this kind declares on creation.
  pub fn default_outputs(&self) -> Vec<String> {
    match self {
      NodeKind::Apply => vec![OUTPUT_CERTIFICATE.to_string()],
      _ => Vec::new(),
    }
  }
}

/// A single step in a workflow chain.
///
/// `next` and `branches` are ownership edges into the owning [`crate::Chain`]'s
/// arena: each node is pointed at by at most one such edge (or is the entry).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowNode {
  pub id: String,
  pub kind: NodeKind,
  pub name: String,
  #[serde(default)]
  pub config: NodeConfig,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub next: Option<String>,
  /// Heads of owned branch sub-chains, in declaration order. Non-empty only
  /// for `Branch` nodes.
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub branches: Vec<String>,
  /// Declared output names, used by downstream nodes to discover selectable
  /// upstream artifacts.
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub outputs: Vec<String>,
}

impl WorkflowNode {
  /// Create a detached node of the given kind with a fresh id, the kind's
  /// default name and its default declared outputs.
  pub fn new(kind: NodeKind) -> Self {
    Self {
      id: uuid::Uuid::new_v4().to_string(),
      kind,
      name: kind.default_name().to_string(),
      config: NodeConfig::new(),
      next: None,
      branches: Vec::new(),
      outputs: kind.default_outputs(),
    }
  }

  /// Create a detached node with a caller-chosen name.
  pub fn named(kind: NodeKind, name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      ..Self::new(kind)
    }
  }

  /// Create a detached node with a caller-chosen name and config.
  pub fn with_config(kind: NodeKind, name: impl Into<String>, config: NodeConfig) -> Self {
    Self {
      name: name.into(),
      config,
      ..Self::new(kind)
    }
  }

  /// Whether this node is detached (no outgoing ownership edges).
  pub fn is_detached(&self) -> bool {
    self.next.is_none() && self.branches.is_empty()
  }
}
