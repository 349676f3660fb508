// SPDX-License-Identifier: MIT OR Apache-2.0

/// Rotating ring of per-minute throughput buckets, fixed at 1440 entries (24 h),
/// per the spec's resolution of the source's ambiguous retention handling (§9).
pub struct ThroughputRing {
    buckets: Vec<u64>,
    current_minute: i64,
    cursor: usize,
}

const CAPACITY: usize = 1440;

impl ThroughputRing {
    pub fn new() -> Self {
        Self {
            buckets: vec![0; CAPACITY],
            current_minute: 0,
            cursor: 0,
        }
    }

    fn advance_to(&mut self, minute: i64) {
        if minute <= self.current_minute && self.current_minute != 0 {
            return;
        }
        let steps = if self.current_minute == 0 {
            0
        } else {
            (minute - self.current_minute).max(0) as usize
        };
        for _ in 0..steps.min(CAPACITY) {
            self.cursor = (self.cursor + 1) % CAPACITY;
            self.buckets[self.cursor] = 0;
        }
        if steps > CAPACITY {
            self.buckets.iter_mut().for_each(|b| *b = 0);
        }
        self.current_minute = minute;
    }

    pub fn record(&mut self, minute: i64, count: u64) {
        self.advance_to(minute);
        self.buckets[self.cursor] += count;
    }

    pub fn current_bucket(&self) -> u64 {
        self.buckets[self.cursor]
    }

    /// Last `n` completed buckets, most recent last, excluding the current one.
    pub fn last_completed(&self, n: usize) -> Vec<u64> {
        let mut out = Vec::with_capacity(n);
        let mut idx = self.cursor;
        for _ in 0..n {
            idx = (idx + CAPACITY - 1) % CAPACITY;
            out.push(self.buckets[idx]);
        }
        out.reverse();
        out
    }
}

impl Default for ThroughputRing {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_into_current_minute_bucket() {
        let mut r = ThroughputRing::new();
        r.record(1, 5);
        r.record(1, 3);
        assert_eq!(r.current_bucket(), 8);
    }

    #[test]
    fn advancing_minute_starts_a_fresh_bucket() {
        let mut r = ThroughputRing::new();
        r.record(1, 5);
        r.record(2, 7);
        assert_eq!(r.current_bucket(), 7);
        assert_eq!(r.last_completed(1), vec![5]);
    }
}
