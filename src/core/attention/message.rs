// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::core::event::Metadata;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    Critical,
    High,
    Normal,
}

/// The minimal view of an inter-component message the Attention Engine scores.
/// Distinct from `Event`: this travels between components on the Coordinator's
/// path, not necessarily something ever appended to the store.
#[derive(Debug, Clone)]
pub struct ScoredMessage {
    pub message_type: String,
    pub source: String,
    pub target: String,
    pub priority: Priority,
    pub deadline_ms_from_now: Option<u64>,
    pub volume_high: bool,
    pub repeat_count: u32,
    pub source_authority_high: bool,
    pub field_count: usize,
    pub metadata: Metadata,
}

impl ScoredMessage {
    pub fn new(message_type: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            message_type: message_type.into(),
            source: source.into(),
            target: target.into(),
            priority: Priority::Normal,
            deadline_ms_from_now: None,
            volume_high: false,
            repeat_count: 0,
            source_authority_high: false,
            field_count: 0,
            metadata: Metadata::new(),
        }
    }

    pub fn with_priority(mut self, p: Priority) -> Self {
        self.priority = p;
        self
    }

    pub fn with_deadline_ms(mut self, ms: u64) -> Self {
        self.deadline_ms_from_now = Some(ms);
        self
    }
}
