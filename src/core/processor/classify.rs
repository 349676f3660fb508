// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::core::event::{Event, NewEvent, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lane {
    HighPriority,
    Analytics,
    PatternMatching,
    NormalPriority,
}

impl Lane {
    pub fn all() -> [Lane; 4] {
        [
            Lane::HighPriority,
            Lane::Analytics,
            Lane::PatternMatching,
            Lane::NormalPriority,
        ]
    }
}

fn urgency_above_threshold(payload: &Value, threshold: f64) -> bool {
    payload
        .get("urgency")
        .and_then(Value::as_f64)
        .map(|u| u > threshold)
        .unwrap_or(false)
}

/// Classification order matters: high priority pre-empts everything else, then
/// analytics and pattern-matching event-type families, else normal (§4.3.2).
pub fn classify(event_type: &str, priority_high: bool, payload: &Value) -> Lane {
    if priority_high
        || event_type.starts_with("algedonic.")
        || event_type.starts_with("system5.")
        || event_type.contains(".critical.")
        || urgency_above_threshold(payload, 0.8)
    {
        return Lane::HighPriority;
    }
    if event_type.contains(".metric.")
        || event_type.contains(".performance.")
        || event_type.starts_with("analytics.")
    {
        return Lane::Analytics;
    }
    const PATTERN_PREFIXES: &[&str] = &[
        "variety.",
        "system1.operation.",
        "system2.coordination.",
        "recursion.",
        "chaos.",
        "emergent.",
    ];
    if PATTERN_PREFIXES.iter().any(|p| event_type.starts_with(p)) {
        return Lane::PatternMatching;
    }
    Lane::NormalPriority
}

pub fn classify_event(event: &Event) -> Lane {
    classify(&event.event_type, false, &event.payload)
}

pub fn classify_new_event(event: &NewEvent, priority_high: bool) -> Lane {
    classify(&event.event_type, priority_high, &event.payload)
}
