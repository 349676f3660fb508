// SPDX-License-Identifier: MIT OR Apache-2.0

//! Canonical topic names (§6). `stream_topic` builds the one parameterized form.

pub const EVENTS_ALL: &str = "events:all";
pub const EVENTS_HIGH_PRIORITY: &str = "events:high_priority";
pub const EVENTS_PATTERNS: &str = "events:patterns";
pub const EVENTS_ERRORS: &str = "events:errors";
pub const EVENTS_LIVE: &str = "events:live";
pub const ANALYTICS_THROUGHPUT: &str = "analytics:throughput";
pub const ANALYTICS_INSIGHTS: &str = "analytics:insights";
pub const VSM_COORDINATION: &str = "vsm:coordination";
pub const EMERGENCY_RESPONSE: &str = "emergency:response";
pub const EMERGENCY_RECURSION: &str = "emergency:recursion";

pub fn stream_topic(stream_id: &str) -> String {
    format!("events:stream:{stream_id}")
}

pub fn context_topic(context_id: &str) -> String {
    format!("vsm:context:{context_id}")
}
