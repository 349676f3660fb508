// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::core::event::Value;
use chrono::{DateTime, Utc};

/// Either "append regardless of current version" or a specific expected version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedVersion {
    Any,
    Exact(u64),
}

/// Outcome of a successful or rejected append.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    Ok { new_version: u64 },
    Conflict { current_version: u64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub stream_id: String,
    pub aggregate_version: u64,
    pub payload: Value,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct StreamMeta {
    pub current_version: u64,
    pub first_timestamp: Option<DateTime<Utc>>,
    pub last_timestamp: Option<DateTime<Utc>>,
    pub snapshot_version: Option<u64>,
}

/// What a caller asked the store to notify on new appends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionKind {
    All,
    Stream(String),
}
