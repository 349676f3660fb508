// SPDX-License-Identifier: MIT OR Apache-2.0

use super::spec::Severity;
use crate::core::event::Event;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct PatternMatch {
    pub pattern_name: String,
    pub severity: Severity,
    pub action_tag: String,
    pub matched_events: Vec<Event>,
    pub confidence: f64,
    pub timestamp: DateTime<Utc>,
}
