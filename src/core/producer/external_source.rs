// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::core::event::NewEvent;

/// External poll contract: the Producer calls `poll()` on a fixed tick and feeds
/// whatever comes back into its buffer like any other source.
pub trait ExternalSource: Send + Sync {
    fn poll(&self) -> Vec<NewEvent>;
}

/// Default source: never yields anything. Used when no external feed is wired.
#[derive(Debug, Default)]
pub struct NullSource;

impl ExternalSource for NullSource {
    fn poll(&self) -> Vec<NewEvent> {
        Vec::new()
    }
}

/// Test-only source that plays back a fixed sequence, one poll-worth at a time.
#[derive(Default)]
pub struct ScriptedSource {
    batches: std::sync::Mutex<std::collections::VecDeque<Vec<NewEvent>>>,
}

impl ScriptedSource {
    pub fn new(batches: Vec<Vec<NewEvent>>) -> Self {
        Self {
            batches: std::sync::Mutex::new(batches.into()),
        }
    }
}

impl ExternalSource for ScriptedSource {
    fn poll(&self) -> Vec<NewEvent> {
        self.batches.lock().unwrap().pop_front().unwrap_or_default()
    }
}
