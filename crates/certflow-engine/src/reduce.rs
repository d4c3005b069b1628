use std::collections::HashMap;

use certflow_store::{LogLine, NodeLogEntry};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One element of a run's flat, chronologically ordered event stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeEvent {
  pub node_id: String,
  pub node_name: String,
  pub event: EventBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventBody {
  Output {
    time: DateTime<Utc>,
    content: String,
  },
  Error {
    time: DateTime<Utc>,
    message: String,
  },
}

/// Fold a flat event stream into per-node log entries.
///
/// Entries appear in first-occurrence order and each holds its events in
/// original relative order. The stream may stop anywhere (mid-run failure):
/// exactly the nodes observed are materialized, and nothing about the run's
/// terminal status is inferred here; the executor sets that independently.
pub fn reduce(events: &[NodeEvent]) -> Vec<NodeLogEntry> {
  let mut entries: Vec<NodeLogEntry> = Vec::new();
  let mut by_node: HashMap<&str, usize> = HashMap::new();

  for event in events {
    let slot = *by_node.entry(event.node_id.as_str()).or_insert_with(|| {
      entries.push(NodeLogEntry {
        node_id: event.node_id.clone(),
        node_name: event.node_name.clone(),
        outputs: Vec::new(),
      });
      entries.len() - 1
    });

    let line = match &event.event {
      EventBody::Output { time, content } => LogLine {
        time: *time,
        content: content.clone(),
        error: None,
      },
      EventBody::Error { time, message } => LogLine {
        time: *time,
        content: String::new(),
        error: Some(message.clone()),
      },
    };
    entries[slot].outputs.push(line);
  }

  entries
}
