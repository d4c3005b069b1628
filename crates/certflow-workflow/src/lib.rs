//! Certflow Workflow
//!
//! This crate provides the workflow graph model for certflow: a chain of
//! heterogeneous nodes (trigger, apply-certificate, branch, deploy, notify,
//! end) stored in an id-addressed arena with explicit `next`/`branches`
//! ownership edges.
//!
//! Key properties:
//! - The chain is a tree: single entry, no sharing, no cycles. Every mutation
//!   preserves this, and [`Chain::check_structure`] verifies it for chains
//!   loaded from persisted state.
//! - A [`Workflow`] owns two independent chain snapshots, `draft` and
//!   `published`. Whether unpublished changes exist is a pure structural
//!   comparison, never a stored flag.
//! - Everything serializes losslessly with serde (node ids, kinds, configs,
//!   ordering, branch structure).

mod chain;
mod error;
mod node;
mod workflow;

pub use chain::{Chain, ChainIter};
pub use error::GraphError;
pub use node::{NodeConfig, NodeKind, OUTPUT_CERTIFICATE, WorkflowNode};
pub use workflow::Workflow;
