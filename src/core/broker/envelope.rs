// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::core::event::{Causality, Value};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Wire message: a causality-tagged payload travelling over a topic. Every hop
/// restores causality context on receive and propagates it forward on send.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub message_id: String,
    pub topic: String,
    pub payload: Value,
    pub causality: Causality,
}

impl Envelope {
    pub fn new(topic: impl Into<String>, payload: Value, causality: Causality) -> Self {
        Self {
            message_id: Uuid::new_v4().to_string(),
            topic: topic.into(),
            payload,
            causality,
        }
    }
}
