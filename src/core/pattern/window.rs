// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::core::event::Event;
use std::collections::VecDeque;

/// Time-bounded, capacity-bounded buffer of recent events the matcher evaluates
/// specs against. Capped at 1000 entries, swept by a 30 s window (§4.4).
pub struct SlidingWindow {
    window_ms: u64,
    capacity: usize,
    entries: VecDeque<(u64, Event)>,
}

impl SlidingWindow {
    pub fn new(window_ms: u64, capacity: usize) -> Self {
        Self {
            window_ms,
            capacity,
            entries: VecDeque::new(),
        }
    }

    pub fn window_ms(&self) -> u64 {
        self.window_ms
    }

    /// Appends `event` at `now_ms` and evicts anything older than the window or
    /// beyond capacity.
    pub fn push(&mut self, event: Event, now_ms: u64) {
        self.entries.push_back((now_ms, event));
        self.evict(now_ms);
    }

    pub fn evict(&mut self, now_ms: u64) {
        while self
            .entries
            .front()
            .map(|(t, _)| now_ms.saturating_sub(*t) > self.window_ms)
            .unwrap_or(false)
        {
            self.entries.pop_front();
        }
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    /// Every buffered event, newest last, paired with its age in milliseconds.
    pub fn events_with_age(&self, now_ms: u64) -> Vec<(u64, &Event)> {
        self.entries
            .iter()
            .map(|(t, e)| (now_ms.saturating_sub(*t), e))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::event::Value;
    use chrono::Utc;
    use uuid::Uuid;

    fn event(event_type: &str) -> Event {
        Event {
            id: Uuid::new_v4(),
            stream_id: "s".into(),
            stream_version: 1,
            global_position: 1,
            event_type: event_type.into(),
            payload: Value::Null,
            metadata: Default::default(),
            correlation_id: None,
            causation_id: None,
            timestamp: Utc::now(),
            causality: None,
        }
    }

    #[test]
    fn evicts_entries_older_than_window() {
        let mut w = SlidingWindow::new(1000, 100);
        w.push(event("a"), 0);
        w.push(event("b"), 500);
        w.evict(1600);
        assert_eq!(w.len(), 1);
    }

    #[test]
    fn caps_at_capacity_even_within_window() {
        let mut w = SlidingWindow::new(100_000, 2);
        w.push(event("a"), 0);
        w.push(event("b"), 1);
        w.push(event("c"), 2);
        assert_eq!(w.len(), 2);
    }
}
