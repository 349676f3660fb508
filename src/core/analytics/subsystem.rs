// SPDX-License-Identifier: MIT OR Apache-2.0

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subsystem {
    S1,
    S2,
    S3,
    S4,
    S5,
}

impl Subsystem {
    pub fn all() -> [Subsystem; 5] {
        [Subsystem::S1, Subsystem::S2, Subsystem::S3, Subsystem::S4, Subsystem::S5]
    }
}

/// Per-subsystem (s1..s5) counters: operations, errors, timeouts, overrides,
/// violations, plus an exponentially-recomputed average latency (§4.5).
#[derive(Debug, Default)]
pub struct SubsystemCounters {
    pub operations: AtomicU64,
    pub errors: AtomicU64,
    pub timeouts: AtomicU64,
    pub overrides: AtomicU64,
    pub violations: AtomicU64,
    avg_latency_bits: AtomicU64,
}

const EWMA_ALPHA: f64 = 0.2;

impl SubsystemCounters {
    pub fn record_operation(&self, latency_ms: f64) {
        self.operations.fetch_add(1, Ordering::Relaxed);
        self.update_avg_latency(latency_ms);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_timeout(&self) {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_override(&self) {
        self.overrides.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_violation(&self) {
        self.violations.fetch_add(1, Ordering::Relaxed);
    }

    fn update_avg_latency(&self, latency_ms: f64) {
        let prev = f64::from_bits(self.avg_latency_bits.load(Ordering::Relaxed));
        let next = if prev == 0.0 {
            latency_ms
        } else {
            EWMA_ALPHA * latency_ms + (1.0 - EWMA_ALPHA) * prev
        };
        self.avg_latency_bits.store(next.to_bits(), Ordering::Relaxed);
    }

    pub fn avg_latency_ms(&self) -> f64 {
        f64::from_bits(self.avg_latency_bits.load(Ordering::Relaxed))
    }

    pub fn snapshot(&self) -> SubsystemSnapshot {
        SubsystemSnapshot {
            operations: self.operations.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            overrides: self.overrides.load(Ordering::Relaxed),
            violations: self.violations.load(Ordering::Relaxed),
            avg_latency_ms: self.avg_latency_ms(),
        }
    }
}

/// Point-in-time read of a subsystem's counters, for dashboards and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SubsystemSnapshot {
    pub operations: u64,
    pub errors: u64,
    pub timeouts: u64,
    pub overrides: u64,
    pub violations: u64,
    pub avg_latency_ms: f64,
}
