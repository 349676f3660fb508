// SPDX-License-Identifier: MIT OR Apache-2.0

//! Drop-oldest overflow accounting for bounded buffers (Producer §4.2).
//!
//! The buffer itself lives with its owner (the Producer); this module only tracks
//! how many times an overflow happened so the count is observable via metrics (P9).

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct DropOldestCounter {
    total_dropped: AtomicU64,
}

impl DropOldestCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_drop(&self) -> u64 {
        self.total_dropped.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn total_dropped(&self) -> u64 {
        self.total_dropped.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_drops() {
        let c = DropOldestCounter::new();
        c.record_drop();
        c.record_drop();
        assert_eq!(c.total_dropped(), 2);
    }
}
