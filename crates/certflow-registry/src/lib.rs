//! Certflow Registry
//!
//! Static table mapping each [`NodeKind`](certflow_workflow::NodeKind) to the
//! schema of its configuration record: required/optional fields, their
//! primitive types, output-reference fields, and cross-field rules expressed
//! as predicates over the full config.
//!
//! The registry is read-only at run time and total over the kind enum, so an
//! unknown kind is unrepresentable rather than a runtime failure. Adding a
//! provider extends the registry (and the executor implementation behind the
//! uniform execute contract); the graph model and validation engine are
//! untouched.

mod registry;
mod schema;

pub use registry::schema_for;
pub use schema::{ConfigSchema, CrossFieldRule, FieldSpec, FieldType, Violation, parse_output_ref};
