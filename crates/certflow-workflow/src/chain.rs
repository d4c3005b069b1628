use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::GraphError;
use crate::node::{NodeConfig, NodeKind, WorkflowNode};

/// An id-addressed arena of workflow nodes forming a single chain with
/// embedded branch fan-out.
///
/// The chain is a tree: one entry node, and every other node is owned by
/// exactly one `next` or branch edge. Mutation methods preserve this;
/// [`Chain::check_structure`] verifies it for chains deserialized from
/// persisted state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chain {
  entry: Option<String>,
  nodes: HashMap<String, WorkflowNode>,
}

impl Chain {
  /// Create an empty chain.
  pub fn new() -> Self {
    Self {
      entry: None,
      nodes: HashMap::new(),
    }
  }

  /// Create a chain seeded with a fresh trigger node as its entry.
  pub fn with_trigger() -> Self {
    Self::starting_at(WorkflowNode::new(NodeKind::Trigger))
  }

  /// Create a chain whose entry is the given detached node.
  pub fn starting_at(node: WorkflowNode) -> Self {
    let id = node.id.clone();
    let mut nodes = HashMap::new();
    nodes.insert(id.clone(), node);
    Self {
      entry: Some(id),
      nodes,
    }
  }

  /// Id of the entry node, if the chain is non-empty.
  pub fn entry(&self) -> Option<&str> {
    self.entry.as_deref()
  }

  /// Look up a node by id.
  pub fn get(&self, node_id: &str) -> Option<&WorkflowNode> {
    self.nodes.get(node_id)
  }

  /// Number of nodes in the arena.
  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }

  /// Splice a detached node between `anchor_id` and its successor.
  ///
  /// Returns the new node's id.
  pub fn insert_after(
    &mut self,
    anchor_id: &str,
    mut node: WorkflowNode,
  ) -> Result<String, GraphError> {
    if !node.is_detached() {
      return Err(GraphError::NodeNotDetached(node.id));
    }
    if self.nodes.contains_key(&node.id) {
      return Err(GraphError::DuplicateId(node.id));
    }
    let anchor = self
      .nodes
      .get_mut(anchor_id)
      .ok_or_else(|| GraphError::NodeNotFound(anchor_id.to_string()))?;

    node.next = anchor.next.take();
    anchor.next = Some(node.id.clone());
    let id = node.id.clone();
    self.nodes.insert(id.clone(), node);
    Ok(id)
  }

  /// Start a new branch sub-chain on a branch node, appended after its
  /// existing branches. Returns the new sub-chain head's id.
  pub fn append_branch(
    &mut self,
    branch_id: &str,
    node: WorkflowNode,
  ) -> Result<String, GraphError> {
    if !node.is_detached() {
      return Err(GraphError::NodeNotDetached(node.id));
    }
    if self.nodes.contains_key(&node.id) {
      return Err(GraphError::DuplicateId(node.id));
    }
    let branch = self
      .nodes
      .get_mut(branch_id)
      .ok_or_else(|| GraphError::NodeNotFound(branch_id.to_string()))?;
    if branch.kind != NodeKind::Branch {
      return Err(GraphError::NotABranch(branch_id.to_string()));
    }

    branch.branches.push(node.id.clone());
    let id = node.id.clone();
    self.nodes.insert(id.clone(), node);
    Ok(id)
  }

  /// Remove a node, re-linking its predecessor to its successor.
  ///
  /// For a branch node this cascades over every owned branch sub-chain; no
  /// dangling references remain. Returns the removed node, detached.
  pub fn remove(&mut self, node_id: &str) -> Result<WorkflowNode, GraphError> {
    let (owned_branches, successor) = {
      let node = self
        .nodes
        .get(node_id)
        .ok_or_else(|| GraphError::NodeNotFound(node_id.to_string()))?;
      (node.branches.clone(), node.next.clone())
    };

    if self.entry.as_deref() == Some(node_id) {
      self.entry = successor.clone();
    } else {
      self.relink_predecessor(node_id, successor);
    }

    for head in owned_branches {
      self.remove_subtree(&head);
    }

    let mut removed = self
      .nodes
      .remove(node_id)
      .ok_or_else(|| GraphError::NodeNotFound(node_id.to_string()))?;
    removed.next = None;
    removed.branches.clear();
    Ok(removed)
  }

  /// Point whatever edge owned `node_id` at `successor` instead. A branch
  /// slot whose replacement would be empty is dropped.
  fn relink_predecessor(&mut self, node_id: &str, successor: Option<String>) {
    for node in self.nodes.values_mut() {
      if node.next.as_deref() == Some(node_id) {
        node.next = successor;
        return;
      }
      if let Some(slot) = node.branches.iter().position(|b| b == node_id) {
        match successor {
          Some(next) => node.branches[slot] = next,
          None => {
            node.branches.remove(slot);
          }
        }
        return;
      }
    }
  }

  /// Drop every node reachable from `head` through `next`/branch edges.
  fn remove_subtree(&mut self, head: &str) {
    let mut pending = vec![head.to_string()];
    while let Some(id) = pending.pop() {
      if let Some(node) = self.nodes.remove(&id) {
        if let Some(next) = node.next {
          pending.push(next);
        }
        pending.extend(node.branches);
      }
    }
  }

  /// Replace a node's configuration. Does not run validation.
  pub fn replace_config(&mut self, node_id: &str, config: NodeConfig) -> Result<(), GraphError> {
    let node = self
      .nodes
      .get_mut(node_id)
      .ok_or_else(|| GraphError::NodeNotFound(node_id.to_string()))?;
    node.config = config;
    Ok(())
  }

  /// Rename a node.
  pub fn rename(&mut self, node_id: &str, name: impl Into<String>) -> Result<(), GraphError> {
    let node = self
      .nodes
      .get_mut(node_id)
      .ok_or_else(|| GraphError::NodeNotFound(node_id.to_string()))?;
    node.name = name.into();
    Ok(())
  }

  /// Pre-order traversal: each node, then its branch sub-chains in
  /// declaration order, then its successor. Lazy and restartable.
  pub fn iter(&self) -> ChainIter<'_> {
    ChainIter {
      chain: self,
      stack: self.entry.as_deref().into_iter().collect(),
      seen: HashSet::new(),
    }
  }

  /// The unique path from the entry to `node_id`, inclusive.
  pub fn path_to(&self, node_id: &str) -> Result<Vec<&WorkflowNode>, GraphError> {
    if !self.nodes.contains_key(node_id) {
      return Err(GraphError::NodeNotFound(node_id.to_string()));
    }

    let mut parent: HashMap<&str, &str> = HashMap::new();
    for node in self.nodes.values() {
      for target in node.next.iter().chain(node.branches.iter()) {
        parent.insert(target.as_str(), node.id.as_str());
      }
    }

    let mut path = vec![node_id];
    let mut current = node_id;
    while let Some(&up) = parent.get(current) {
      if path.len() > self.nodes.len() {
        return Err(GraphError::Cycle(current.to_string()));
      }
      path.push(up);
      current = up;
    }
    if self.entry.as_deref() != Some(current) {
      return Err(GraphError::Unreachable(node_id.to_string()));
    }

    path.reverse();
    Ok(path.iter().map(|id| &self.nodes[*id]).collect())
  }

  /// Upstream nodes on the entry→`node_id` path (exclusive) that declare
  /// `output_kind`, in path order. Sibling branches are never visible.
  pub fn outputs_available_before(
    &self,
    node_id: &str,
    output_kind: &str,
  ) -> Result<Vec<&WorkflowNode>, GraphError> {
    let mut path = self.path_to(node_id)?;
    path.pop();
    Ok(
      path
        .into_iter()
        .filter(|node| node.outputs.iter().any(|o| o == output_kind))
        .collect(),
    )
  }

  /// Verify the tree invariants: a single trigger entry, every edge
  /// resolving, every node owned by exactly one edge, no cycles.
  ///
  /// Mutations through this type cannot break these; a failure indicates
  /// corrupted persisted state.
  pub fn check_structure(&self) -> Result<(), GraphError> {
    let Some(entry) = self.entry.as_deref() else {
      return match self.nodes.keys().min() {
        None => Err(GraphError::EmptyChain),
        Some(id) => Err(GraphError::Unreachable(id.clone())),
      };
    };
    if !self.nodes.contains_key(entry) {
      return Err(GraphError::DanglingEdge {
        from: "<entry>".to_string(),
        to: entry.to_string(),
      });
    }

    let mut in_degree: HashMap<&str, usize> = HashMap::new();
    for node in self.nodes.values() {
      for target in node.next.iter().chain(node.branches.iter()) {
        if !self.nodes.contains_key(target) {
          return Err(GraphError::DanglingEdge {
            from: node.id.clone(),
            to: target.clone(),
          });
        }
        *in_degree.entry(target.as_str()).or_insert(0) += 1;
      }
      if !node.branches.is_empty() && node.kind != NodeKind::Branch {
        return Err(GraphError::NotABranch(node.id.clone()));
      }
    }

    if in_degree.get(entry).copied().unwrap_or(0) > 0 {
      return Err(GraphError::Cycle(entry.to_string()));
    }
    if let Some(shared) = self
      .nodes
      .keys()
      .filter(|id| in_degree.get(id.as_str()).copied().unwrap_or(0) > 1)
      .min()
    {
      return Err(GraphError::SharedNode(shared.clone()));
    }

    let reachable: HashSet<&str> = self.iter().map(|n| n.id.as_str()).collect();
    if reachable.len() != self.nodes.len()
      && let Some(orphan) = self
        .nodes
        .keys()
        .filter(|id| !reachable.contains(id.as_str()))
        .min()
    {
      return Err(GraphError::Unreachable(orphan.clone()));
    }

    if self.nodes[entry].kind != NodeKind::Trigger {
      return Err(GraphError::EntryNotTrigger(entry.to_string()));
    }
    let triggers = self
      .nodes
      .values()
      .filter(|n| n.kind == NodeKind::Trigger)
      .count();
    if triggers != 1 {
      return Err(GraphError::TriggerCount(triggers));
    }

    Ok(())
  }

  /// Whether two chains are equal node for node in traversal order,
  /// including ids, names, configs and declared outputs.
  pub fn structurally_equal(&self, other: &Chain) -> bool {
    let mut a = self.iter();
    let mut b = other.iter();
    loop {
      match (a.next(), b.next()) {
        (None, None) => return true,
        (Some(x), Some(y)) if x == y => continue,
        _ => return false,
      }
    }
  }
}

impl Default for Chain {
  fn default() -> Self {
    Self::new()
  }
}

/// Lazy pre-order iterator over a [`Chain`].
///
/// Skips edges that do not resolve and never revisits a node, so it stays
/// finite even over a corrupted arena.
pub struct ChainIter<'a> {
  chain: &'a Chain,
  stack: Vec<&'a str>,
  seen: HashSet<&'a str>,
}

impl<'a> Iterator for ChainIter<'a> {
  type Item = &'a WorkflowNode;

  fn next(&mut self) -> Option<Self::Item> {
    loop {
      let id = self.stack.pop()?;
      if !self.seen.insert(id) {
        continue;
      }
      let Some(node) = self.chain.nodes.get(id) else {
        continue;
      };
      if let Some(next) = &node.next {
        self.stack.push(next);
      }
      for branch in node.branches.iter().rev() {
        self.stack.push(branch);
      }
      return Some(node);
    }
  }
}
