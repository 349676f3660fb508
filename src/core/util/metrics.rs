// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process-wide named counters, timers and throughput trackers.
//!
//! Every component registers its own trackers by name rather than sharing state; the
//! global maps here only exist so a dashboard or test can look a tracker up by name
//! without threading a handle through every constructor.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex,
};
use std::time::Duration;

static LATENCY_TRACKERS: Lazy<Mutex<HashMap<String, Arc<LatencyTracker>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));
static THROUGHPUT_TRACKERS: Lazy<Mutex<HashMap<String, Arc<ThroughputTracker>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));
static COUNTERS: Lazy<Mutex<HashMap<String, Arc<Counter>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

#[derive(Debug, Default)]
pub struct LatencyTracker {
    total_ns: AtomicU64,
    count: AtomicU64,
    min_ns: AtomicU64,
    max_ns: AtomicU64,
}

impl LatencyTracker {
    pub fn named(name: &str) -> Arc<Self> {
        let mut map = LATENCY_TRACKERS.lock().unwrap();
        map.entry(name.to_string())
            .or_insert_with(|| Arc::new(Self::default()))
            .clone()
    }

    pub fn record(&self, dur: Duration) {
        let ns = dur.as_nanos() as u64;
        self.total_ns.fetch_add(ns, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);
        self.min_ns.fetch_min(ns, Ordering::Relaxed);
        self.max_ns.fetch_max(ns, Ordering::Relaxed);
    }

    pub fn average_ms(&self) -> f64 {
        let c = self.count.load(Ordering::Relaxed);
        if c == 0 {
            0.0
        } else {
            (self.total_ns.load(Ordering::Relaxed) as f64 / c as f64) / 1_000_000.0
        }
    }

    pub fn min_ms(&self) -> f64 {
        self.min_ns.load(Ordering::Relaxed) as f64 / 1_000_000.0
    }

    pub fn max_ms(&self) -> f64 {
        self.max_ns.load(Ordering::Relaxed) as f64 / 1_000_000.0
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Default)]
pub struct ThroughputTracker {
    total: AtomicU64,
}

impl ThroughputTracker {
    pub fn named(name: &str) -> Arc<Self> {
        let mut map = THROUGHPUT_TRACKERS.lock().unwrap();
        map.entry(name.to_string())
            .or_insert_with(|| Arc::new(Self::default()))
            .clone()
    }

    pub fn record(&self, n: u64) {
        self.total.fetch_add(n, Ordering::Relaxed);
    }

    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Default)]
pub struct Counter {
    count: AtomicU64,
}

impl Counter {
    pub fn named(name: &str) -> Arc<Self> {
        let mut map = COUNTERS.lock().unwrap();
        map.entry(name.to_string())
            .or_insert_with(|| Arc::new(Self::default()))
            .clone()
    }

    pub fn inc(&self) -> u64 {
        self.count.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn add(&self, v: u64) -> u64 {
        self.count.fetch_add(v, Ordering::Relaxed) + v
    }

    pub fn value(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_is_shared_by_name() {
        let a = Counter::named("test_counter_shared");
        let b = Counter::named("test_counter_shared");
        a.inc();
        b.inc();
        assert_eq!(a.value(), 2);
    }

    #[test]
    fn latency_tracker_averages() {
        let t = LatencyTracker::named("test_latency_unique_1");
        t.record(Duration::from_millis(10));
        t.record(Duration::from_millis(20));
        assert!((t.average_ms() - 15.0).abs() < 0.5);
    }
}
