use certflow_workflow::NodeKind;

use crate::schema::{ConfigSchema, CrossFieldRule, FieldSpec, FieldType};

fn string_field(config: &certflow_workflow::NodeConfig, key: &str) -> Option<String> {
  config
    .get(key)
    .and_then(|v| v.as_str())
    .map(|s| s.to_string())
}

/// Trigger: manual, or scheduled via a crontab expression.
static TRIGGER: ConfigSchema = ConfigSchema {
  fields: &[
    FieldSpec {
      key: "execution_method",
      ty: FieldType::String,
      required: true,
    },
    FieldSpec {
      key: "crontab",
      ty: FieldType::String,
      required: false,
    },
  ],
  rules: &[CrossFieldRule {
    description: "crontab is required when execution_method is \"auto\"",
    check: |config| {
      string_field(config, "execution_method").as_deref() != Some("auto")
        || string_field(config, "crontab").is_some_and(|s| !s.is_empty())
    },
  }],
};

/// Apply-certificate: domains to issue for, contact email, and the DNS
/// provider credential used for the ACME challenge.
static APPLY: ConfigSchema = ConfigSchema {
  fields: &[
    FieldSpec {
      key: "domains",
      ty: FieldType::String,
      required: true,
    },
    FieldSpec {
      key: "email",
      ty: FieldType::String,
      required: true,
    },
    FieldSpec {
      key: "access",
      ty: FieldType::String,
      required: true,
    },
    FieldSpec {
      key: "key_algorithm",
      ty: FieldType::String,
      required: false,
    },
    FieldSpec {
      key: "nameservers",
      ty: FieldType::String,
      required: false,
    },
    FieldSpec {
      key: "skip_before_expiry_days",
      ty: FieldType::Integer,
      required: false,
    },
  ],
  rules: &[],
};

/// Branch: carries no configuration of its own; its sub-chains validate
/// independently.
static BRANCH: ConfigSchema = ConfigSchema {
  fields: &[],
  rules: &[],
};

/// Deploy: pushes an upstream certificate to a provider resource.
static DEPLOY: ConfigSchema = ConfigSchema {
  fields: &[
    FieldSpec {
      key: "provider",
      ty: FieldType::String,
      required: true,
    },
    FieldSpec {
      key: "access",
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
      key: "resource_type",
      ty: FieldType::String,
      required: false,
    },
    FieldSpec {
      key: "listener_id",
      ty: FieldType::String,
      required: false,
    },
  ],
  rules: &[CrossFieldRule {
    description: "listener_id is required when resource_type is \"listener\"",
    check: |config| {
      string_field(config, "resource_type").as_deref() != Some("listener")
        || string_field(config, "listener_id").is_some_and(|s| !s.is_empty())
    },
  }],
};

/// Notify: channel to send on, with optional subject and message overrides.
static NOTIFY: ConfigSchema = ConfigSchema {
  fields: &[
    FieldSpec {
      key: "channel",
      ty: FieldType::String,
      required: true,
    },
    FieldSpec {
      key: "subject",
      ty: FieldType::String,
      required: false,
    },
    FieldSpec {
      key: "message",
      ty: FieldType::String,
      required: false,
    },
  ],
  rules: &[],
};

static END: ConfigSchema = ConfigSchema {
  fields: &[],
  rules: &[],
};

/// Schema for a node kind's configuration record.
///
/// Total over the enum: there is no unknown-kind failure mode at run time.
pub fn schema_for(kind: NodeKind) -> &'static ConfigSchema {
  match kind {
    NodeKind::Trigger => &TRIGGER,
    NodeKind::Apply => &APPLY,
    NodeKind::Branch => &BRANCH,
    NodeKind::Deploy => &DEPLOY,
    NodeKind::Notify => &NOTIFY,
    NodeKind::End => &END,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::schema::Violation;
  use certflow_workflow::NodeConfig;
  use serde_json::json;

  fn config(pairs: &[(&str, serde_json::Value)]) -> NodeConfig {
    pairs
      .iter()
      .map(|(k, v)| (k.to_string(), v.clone()))
      .collect()
  }

  #[test]
  fn manual_trigger_needs_no_crontab() {
    let schema = schema_for(NodeKind::Trigger);
    let ok = config(&[("execution_method", json!("manual"))]);
    assert_eq!(schema.check(&ok), Ok(()));
  }

  #[test]
  fn auto_trigger_requires_a_crontab() {
    let schema = schema_for(NodeKind::Trigger);
    let missing = config(&[("execution_method", json!("auto"))]);
    assert!(matches!(
      schema.check(&missing),
      Err(Violation::RuleBroken(_))
    ));

    let ok = config(&[
      ("execution_method", json!("auto")),
      ("crontab", json!("0 0 * * *")),
    ]);
    assert_eq!(schema.check(&ok), Ok(()));
  }

  #[test]
  fn deploy_listener_resource_requires_listener_id() {
    let schema = schema_for(NodeKind::Deploy);
    let base = [
      ("provider", json!("aliyun-alb")),
      ("access", json!("access-1")),
      ("certificate", json!("apply-1#certificate")),
      ("resource_type", json!("listener")),
    ];
    assert!(matches!(
      schema.check(&config(&base)),
      Err(Violation::RuleBroken(_))
    ));

    let mut with_listener = base.to_vec();
    with_listener.push(("listener_id", json!("lsn-123")));
    assert_eq!(schema.check(&config(&with_listener)), Ok(()));
  }

  #[test]
  fn deploy_certificate_field_is_an_output_ref() {
    let schema = schema_for(NodeKind::Deploy);
    let refs: Vec<_> = schema.output_refs().collect();
    assert_eq!(refs, vec![("certificate", "certificate")]);
  }

  #[test]
  fn branch_and_end_accept_empty_configs() {
    assert_eq!(schema_for(NodeKind::Branch).check(&NodeConfig::new()), Ok(()));
    assert_eq!(schema_for(NodeKind::End).check(&NodeConfig::new()), Ok(()));
  }
}
