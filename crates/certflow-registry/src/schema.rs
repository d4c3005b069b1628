use certflow_workflow::NodeConfig;
use serde_json::Value;
use thiserror::Error;

/// Primitive type of a configuration field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
  String,
  Integer,
  Boolean,
  /// A reference to an upstream node's declared output, written as
  /// `"<nodeId>#<outputName>"`. `kind` names the output the field selects
  /// (e.g. `certificate`).
  OutputRef { kind: &'static str },
}

impl FieldType {
  fn describe(&self) -> &'static str {
    match self {
      FieldType::String => "string",
      FieldType::Integer => "integer",
      FieldType::Boolean => "boolean",
      FieldType::OutputRef { .. } => "output reference (\"nodeId#output\")",
    }
  }

  fn accepts(&self, value: &Value) -> bool {
    match self {
      FieldType::String => value.is_string(),
      FieldType::Integer => value.is_i64() || value.is_u64(),
      FieldType::Boolean => value.is_boolean(),
      FieldType::OutputRef { .. } => value
        .as_str()
        .and_then(parse_output_ref)
        .is_some(),
    }
  }
}

/// One field of a configuration record.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
  pub key: &'static str,
  pub ty: FieldType,
  pub required: bool,
}

/// A constraint over the whole configuration record, for requirements a
/// single field spec cannot express ("listener_id required iff resource_type
/// is listener").
pub struct CrossFieldRule {
  pub description: &'static str,
  pub check: fn(&NodeConfig) -> bool,
}

/// The first schema violation found in a configuration record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
  #[error("missing required field '{key}'")]
  MissingField { key: &'static str },

  #[error("field '{key}' must be a {expected}")]
  WrongType {
    key: &'static str,
    expected: &'static str,
  },

  #[error("{0}")]
  RuleBroken(&'static str),
}

/// Schema for one node kind's configuration record.
pub struct ConfigSchema {
  pub fields: &'static [FieldSpec],
  pub rules: &'static [CrossFieldRule],
}

impl ConfigSchema {
  /// Check a configuration record, reporting the first violation in
  /// declaration order. Deterministic for a given record.
  pub fn check(&self, config: &NodeConfig) -> Result<(), Violation> {
    for field in self.fields {
      match config.get(field.key) {
        None | Some(Value::Null) => {
          if field.required {
            return Err(Violation::MissingField { key: field.key });
          }
        }
        Some(value) => {
          if !field.ty.accepts(value) {
            return Err(Violation::WrongType {
              key: field.key,
              expected: field.ty.describe(),
            });
          }
        }
      }
    }
    for rule in self.rules {
      if !(rule.check)(config) {
        return Err(Violation::RuleBroken(rule.description));
      }
    }
    Ok(())
  }

  /// Output-reference fields declared by this schema, as
  /// `(key, referenced output name)` pairs in declaration order.
  pub fn output_refs(&self) -> impl Iterator<Item = (&'static str, &'static str)> {
    self.fields.iter().filter_map(|field| match field.ty {
      FieldType::OutputRef { kind } => Some((field.key, kind)),
      _ => None,
    })
  }
}

/// Split an output reference into `(node_id, output_name)`. Both halves must
/// be non-empty.
pub fn parse_output_ref(value: &str) -> Option<(&str, &str)> {
  let (node_id, output) = value.split_once('#')?;
  if node_id.is_empty() || output.is_empty() {
    return None;
  }
  Some((node_id, output))
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn config(pairs: &[(&str, Value)]) -> NodeConfig {
    pairs
      .iter()
      .map(|(k, v)| (k.to_string(), v.clone()))
      .collect()
  }

  const SCHEMA: ConfigSchema = ConfigSchema {
    fields: &[
      FieldSpec {
        key: "provider",
        ty: FieldType::String,
        required: true,
      },
      FieldSpec {
        key: "certificate",
        ty: FieldType::OutputRef {
          kind: "certificate",
        },
        required: true,
      },
      FieldSpec {
        key: "retries",
        ty: FieldType::Integer,
        required: false,
      },
    ],
    rules: &[CrossFieldRule {
      description: "retries requires a provider",
      check: |c| !c.contains_key("retries") || c.contains_key("provider"),
    }],
  };

  #[test]
  fn reports_first_missing_field() {
    let err = SCHEMA.check(&config(&[])).unwrap_err();
    assert_eq!(err, Violation::MissingField { key: "provider" });
  }

  #[test]
  fn reports_wrong_primitive_type() {
    let err = SCHEMA
      .check(&config(&[
        ("provider", json!(42)),
        ("certificate", json!("a#certificate")),
      ]))
      .unwrap_err();
    assert!(matches!(err, Violation::WrongType { key: "provider", .. }));
  }

  #[test]
  fn output_ref_must_have_both_halves() {
    for bad in ["certificate", "#certificate", "node#", ""] {
      let err = SCHEMA
        .check(&config(&[
          ("provider", json!("k8s")),
          ("certificate", json!(bad)),
        ]))
        .unwrap_err();
      assert!(matches!(err, Violation::WrongType { key: "certificate", .. }), "{bad:?}");
    }
  }

  #[test]
  fn optional_fields_may_be_absent_or_null() {
    let ok = config(&[
      ("provider", json!("k8s")),
      ("certificate", json!("a#certificate")),
      ("retries", json!(null)),
    ]);
    assert_eq!(SCHEMA.check(&ok), Ok(()));
  }

  #[test]
  fn parse_output_ref_splits_on_first_hash() {
    assert_eq!(parse_output_ref("node-1#certificate"), Some(("node-1", "certificate")));
    assert_eq!(parse_output_ref("node-1"), None);
  }
}
