use thiserror::Error;

/// Errors raised by graph mutations and structural checks.
///
/// The structural variants (`Cycle`, `SharedNode`, `Unreachable`,
/// `DanglingEdge`, trigger placement) indicate corrupted persisted state.
/// Normal editing through [`crate::Chain`]'s mutation methods never
/// produces them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
  #[error("node not found: {0}")]
  NodeNotFound(String),

  #[error("duplicate node id: {0}")]
  DuplicateId(String),

  #[error("node '{0}' is already linked and cannot be inserted")]
  NodeNotDetached(String),

  #[error("node '{0}' is not a branch node")]
  NotABranch(String),

  #[error("chain has no nodes")]
  EmptyChain,

  #[error("entry node '{0}' is not a trigger")]
  EntryNotTrigger(String),

  #[error("chain must contain exactly one trigger, found {0}")]
  TriggerCount(usize),

  #[error("edge references unknown node: from={from}, to={to}")]
  DanglingEdge { from: String, to: String },

  #[error("node '{0}' is reachable from more than one predecessor")]
  SharedNode(String),

  #[error("cycle detected through node '{0}'")]
  Cycle(String),

  #[error("node '{0}' is not reachable from the entry")]
  Unreachable(String),
}
