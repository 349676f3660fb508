// SPDX-License-Identifier: MIT OR Apache-2.0

//! The immutable `Event` record owned exclusively by the Event Store once appended.

use super::causality::Causality;
use super::value::{Metadata, Value};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub stream_id: String,
    pub stream_version: u64,
    pub global_position: u64,
    pub event_type: String,
    pub payload: Value,
    pub metadata: Metadata,
    pub correlation_id: Option<String>,
    pub causation_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub causality: Option<Causality>,
}

/// What a caller supplies before the store assigns version/position/id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    pub event_type: String,
    pub payload: Value,
    pub metadata: Metadata,
    pub correlation_id: Option<String>,
    pub causation_id: Option<String>,
}

impl NewEvent {
    pub fn new(event_type: impl Into<String>, payload: Value) -> Self {
        Self {
            event_type: event_type.into(),
            payload,
            metadata: Metadata::new(),
            correlation_id: None,
            causation_id: None,
        }
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }
}

impl Event {
    /// `true` if `event_type` starts with any of `prefixes`.
    pub fn type_has_prefix(&self, prefixes: &[&str]) -> bool {
        prefixes.iter().any(|p| self.event_type.starts_with(p))
    }

    pub fn type_contains(&self, needle: &str) -> bool {
        self.event_type.contains(needle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn new_event_builder_sets_optional_fields() {
        let n = NewEvent::new("system1.operation.completed", Value::Null)
            .with_correlation_id("abc123");
        assert_eq!(n.correlation_id.as_deref(), Some("abc123"));
        assert!(n.metadata.is_empty());
    }

    #[test]
    fn type_prefix_and_contains() {
        let e = Event {
            id: Uuid::new_v4(),
            stream_id: "orders-1".into(),
            stream_version: 1,
            global_position: 1,
            event_type: "algedonic.pain.detected".into(),
            payload: Value::Map(BTreeMap::new()),
            metadata: Metadata::new(),
            correlation_id: None,
            causation_id: None,
            timestamp: Utc::now(),
            causality: None,
        };
        assert!(e.type_has_prefix(&["algedonic.", "system5."]));
        assert!(e.type_contains(".pain."));
        assert!(!e.type_has_prefix(&["system1."]));
    }
}
