use certflow_registry::{parse_output_ref, schema_for};
use certflow_workflow::{Chain, NodeKind};

/// The first node, in traversal order, whose configuration fails its schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidNode {
  pub node_id: String,
  pub reason: String,
}

/// Outcome of validating a chain.
///
/// A chain with no entry node (empty, or corrupted persisted state) is
/// invalid with no offending node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
  pub valid: bool,
  pub first_invalid: Option<InvalidNode>,
}

impl ValidationReport {
  fn ok() -> Self {
    Self {
      valid: true,
      first_invalid: None,
    }
  }

  fn no_entry() -> Self {
    Self {
      valid: false,
      first_invalid: None,
    }
  }

  fn fail(node_id: impl Into<String>, reason: impl Into<String>) -> Self {
    Self {
      valid: false,
      first_invalid: Some(InvalidNode {
        node_id: node_id.into(),
        reason: reason.into(),
      }),
    }
  }
}

/// Validate a chain against the registry schemas.
///
/// Pre-order walk, short-circuiting on the first failing node, so repeated
/// calls on an unchanged chain always name the same failure. A branch node
/// is valid only if its own configuration passes and every owned sub-chain
/// validates; the walk visits sub-chain nodes in declaration order, which
/// gives exactly that. Never mutates the chain.
///
/// A chain without an entry node is invalid outright, whether empty or an
/// entry-less arena loaded from corrupted state, so this is safe to call
/// without a prior [`Chain::check_structure`].
pub fn validate(chain: &Chain) -> ValidationReport {
  let Some(entry) = chain.entry() else {
    return ValidationReport::no_entry();
  };

  for node in chain.iter() {
    let is_entry = node.id == entry;
    if is_entry && node.kind != NodeKind::Trigger {
      return ValidationReport::fail(&node.id, "chain must start with a trigger node");
    }
    if !is_entry && node.kind == NodeKind::Trigger {
      return ValidationReport::fail(&node.id, "trigger nodes may only start the chain");
    }
    if node.kind == NodeKind::Branch && node.branches.is_empty() {
      return ValidationReport::fail(&node.id, "branch node owns no branches");
    }

    let schema = schema_for(node.kind);
    if let Err(violation) = schema.check(&node.config) {
      return ValidationReport::fail(&node.id, violation.to_string());
    }

    // Output-reference fields must resolve to an ancestor on this node's
    // path that declares the referenced output. Descendants and sibling
    // branches are never candidates.
    for (key, output_kind) in schema.output_refs() {
      let Some(value) = node.config.get(key).and_then(|v| v.as_str()) else {
        continue;
      };
      let Some((ref_node_id, ref_output)) = parse_output_ref(value) else {
        continue; // format already rejected by the schema check
      };
      if ref_output != output_kind {
        return ValidationReport::fail(
          &node.id,
          format!("field '{key}' must reference a '{output_kind}' output"),
        );
      }
      let upstream = chain
        .outputs_available_before(&node.id, output_kind)
        .unwrap_or_default();
      if !upstream.iter().any(|n| n.id == ref_node_id) {
        return ValidationReport::fail(
          &node.id,
          format!("field '{key}' references '{value}', which no upstream node provides"),
        );
      }
    }
  }

  ValidationReport::ok()
}
