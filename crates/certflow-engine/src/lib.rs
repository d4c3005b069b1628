//! Certflow Engine
//!
//! The engine covers the three run-time concerns of certflow:
//!
//! - **Validation**: [`validate`] walks a chain in pre-order, checks every
//!   node's configuration against its registry schema, resolves output
//!   references against upstream declarations, and reports the first failing
//!   node deterministically.
//! - **Execution**: [`WorkflowRunner`] drives a published snapshot node by
//!   node through the [`NodeExecutor`] contract, sequentially and
//!   cancellably. Provider-specific issuance/deployment logic lives entirely
//!   behind that contract.
//! - **Log reduction**: [`reduce`] folds the flat, chronologically ordered
//!   event stream of a run into per-node log entries, tolerant of streams
//!   truncated by mid-run failure.

mod error;
mod executor;
mod reduce;
mod runner;
mod validate;

pub use error::{ExecutionError, NodeExecutionError};
pub use executor::{NodeExecutor, OutputEvent, RunContext};
pub use reduce::{EventBody, NodeEvent, reduce};
pub use runner::WorkflowRunner;
pub use validate::{InvalidNode, ValidationReport, validate};
