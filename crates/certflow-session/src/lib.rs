//! Certflow Session
//!
//! One [`WorkflowSession`] wraps one [`Workflow`](certflow_workflow::Workflow)
//! and owns its lifecycle: draft edits, committing a validated draft to
//! published, and enabling/disabling. The four operations are serialized
//! behind a single per-workflow mutex, so a commit can never observe a
//! half-applied edit. No cross-workflow locking exists; sessions for
//! different workflows proceed independently.

mod error;
mod session;

pub use error::SessionError;
pub use session::{LifecycleState, WorkflowSession};
