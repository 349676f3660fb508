// SPDX-License-Identifier: MIT OR Apache-2.0

//! Analytics (C5): rolling metrics over ingested events and observed latencies.

pub mod dashboard;
pub mod ring;
pub mod subsystem;

use dashboard::{top_k, Anomaly, AnomalySeverity, DashboardSnapshot, Trend};
use ring::ThroughputRing;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use subsystem::SubsystemCounters;

pub use subsystem::{Subsystem, SubsystemSnapshot};

const DASHBOARD_CACHE_TTL: Duration = Duration::from_secs(30);
const TREND_WINDOW_MINUTES: usize = 5;
const ANOMALY_SAMPLE_MINUTES: usize = 5;

#[derive(Debug, Default)]
struct AlgedonicBalance {
    pain_count: u64,
    pleasure_count: u64,
    pain_mean_intensity: f64,
    pleasure_mean_intensity: f64,
}

pub struct Analytics {
    events_processed: AtomicU64,
    total_latency_ns: AtomicU64,
    min_latency_ns: AtomicU64,
    max_latency_ns: AtomicU64,
    throughput_ring: Mutex<ThroughputRing>,
    type_distribution: Mutex<HashMap<String, u64>>,
    subsystems: [SubsystemCounters; 5],
    algedonic: Mutex<AlgedonicBalance>,
    last_trend: Mutex<Option<Trend>>,
    dashboard_cache: Mutex<Option<(Instant, DashboardSnapshot)>>,
}

impl Default for Analytics {
    fn default() -> Self {
        Self::new()
    }
}

impl Analytics {
    pub fn new() -> Self {
        Self {
            events_processed: AtomicU64::new(0),
            total_latency_ns: AtomicU64::new(0),
            min_latency_ns: AtomicU64::new(u64::MAX),
            max_latency_ns: AtomicU64::new(0),
            throughput_ring: Mutex::new(ThroughputRing::new()),
            type_distribution: Mutex::new(HashMap::new()),
            subsystems: Default::default(),
            algedonic: Mutex::new(AlgedonicBalance::default()),
            last_trend: Mutex::new(None),
            dashboard_cache: Mutex::new(None),
        }
    }

    fn subsystem(&self, s: Subsystem) -> &SubsystemCounters {
        &self.subsystems[match s {
            Subsystem::S1 => 0,
            Subsystem::S2 => 1,
            Subsystem::S3 => 2,
            Subsystem::S4 => 3,
            Subsystem::S5 => 4,
        }]
    }

    pub fn record_event(&self, event_type: &str, latency: Duration, minute: i64) {
        self.events_processed.fetch_add(1, Ordering::Relaxed);
        let ns = latency.as_nanos() as u64;
        self.total_latency_ns.fetch_add(ns, Ordering::Relaxed);
        self.min_latency_ns.fetch_min(ns, Ordering::Relaxed);
        self.max_latency_ns.fetch_max(ns, Ordering::Relaxed);
        *self
            .type_distribution
            .lock()
            .unwrap()
            .entry(event_type.to_string())
            .or_insert(0) += 1;
        self.throughput_ring.lock().unwrap().record(minute, 1);
    }

    pub fn record_subsystem_operation(&self, s: Subsystem, latency_ms: f64) {
        self.subsystem(s).record_operation(latency_ms);
    }
    pub fn record_subsystem_error(&self, s: Subsystem) {
        self.subsystem(s).record_error();
    }
    pub fn record_subsystem_timeout(&self, s: Subsystem) {
        self.subsystem(s).record_timeout();
    }
    pub fn record_subsystem_override(&self, s: Subsystem) {
        self.subsystem(s).record_override();
    }
    pub fn record_subsystem_violation(&self, s: Subsystem) {
        self.subsystem(s).record_violation();
    }

    pub fn subsystem_snapshot(&self, s: Subsystem) -> SubsystemSnapshot {
        self.subsystem(s).snapshot()
    }

    pub fn record_algedonic(&self, is_pain: bool, intensity: f64) {
        let mut balance = self.algedonic.lock().unwrap();
        if is_pain {
            let n = balance.pain_count as f64;
            balance.pain_mean_intensity = (balance.pain_mean_intensity * n + intensity) / (n + 1.0);
            balance.pain_count += 1;
        } else {
            let n = balance.pleasure_count as f64;
            balance.pleasure_mean_intensity = (balance.pleasure_mean_intensity * n + intensity) / (n + 1.0);
            balance.pleasure_count += 1;
        }
    }

    pub fn avg_latency_ms(&self) -> f64 {
        let count = self.events_processed.load(Ordering::Relaxed);
        if count == 0 {
            0.0
        } else {
            (self.total_latency_ns.load(Ordering::Relaxed) as f64 / count as f64) / 1_000_000.0
        }
    }

    pub fn max_latency_ms(&self) -> f64 {
        self.max_latency_ns.load(Ordering::Relaxed) as f64 / 1_000_000.0
    }

    /// Every 5 minutes: compare the mean of the last 5 minutes to the mean of
    /// the previous 5 minutes, using ±10% thresholds (§4.5).
    pub fn detect_trend(&self) -> Option<Trend> {
        let ring = self.throughput_ring.lock().unwrap();
        let samples = ring.last_completed(TREND_WINDOW_MINUTES * 2);
        drop(ring);
        if samples.len() < TREND_WINDOW_MINUTES * 2 {
            return None;
        }
        let (previous, recent) = samples.split_at(TREND_WINDOW_MINUTES);
        let mean = |xs: &[u64]| xs.iter().sum::<u64>() as f64 / xs.len() as f64;
        let prev_mean = mean(previous);
        let recent_mean = mean(recent);
        let trend = if prev_mean == 0.0 {
            Trend::Stable
        } else if recent_mean > prev_mean * 1.10 {
            Trend::Increasing
        } else if recent_mean < prev_mean * 0.90 {
            Trend::Decreasing
        } else {
            Trend::Stable
        };
        *self.last_trend.lock().unwrap() = Some(trend);
        Some(trend)
    }

    /// Current-minute throughput vs 2σ/3σ over the last 5 minutes; max latency
    /// vs 5x mean latency (§4.5). Sample size of 5 is statistically weak but
    /// preserved for behavior parity, per design note.
    pub fn detect_anomalies(&self) -> Vec<Anomaly> {
        let mut anomalies = Vec::new();
        let ring = self.throughput_ring.lock().unwrap();
        let samples = ring.last_completed(ANOMALY_SAMPLE_MINUTES);
        let current = ring.current_bucket();
        drop(ring);
        if samples.len() == ANOMALY_SAMPLE_MINUTES {
            let mean = samples.iter().sum::<u64>() as f64 / samples.len() as f64;
            let variance = samples.iter().map(|v| (*v as f64 - mean).powi(2)).sum::<f64>() / samples.len() as f64;
            let sigma = variance.sqrt();
            if sigma > 0.0 {
                let deviation = (current as f64 - mean).abs() / sigma;
                if deviation > 3.0 {
                    anomalies.push(Anomaly::Throughput {
                        severity: AnomalySeverity::High,
                        deviation_sigma: deviation,
                    });
                } else if deviation > 2.0 {
                    anomalies.push(Anomaly::Throughput {
                        severity: AnomalySeverity::Medium,
                        deviation_sigma: deviation,
                    });
                }
            }
        }

        let avg = self.avg_latency_ms();
        let max = self.max_latency_ms();
        if avg > 0.0 && max > avg * 5.0 {
            anomalies.push(Anomaly::Latency { ratio_to_mean: max / avg });
        }
        anomalies
    }

    /// Cached 30 s (§4.5); recomputes trend/anomalies only on a cache miss.
    pub fn dashboard_snapshot(&self, now: Instant) -> DashboardSnapshot {
        if let Some((cached_at, snapshot)) = self.dashboard_cache.lock().unwrap().as_ref() {
            if now.duration_since(*cached_at) < DASHBOARD_CACHE_TTL {
                return snapshot.clone();
            }
        }
        let distribution = self.type_distribution.lock().unwrap();
        let snapshot = DashboardSnapshot {
            events_processed: self.events_processed.load(Ordering::Relaxed),
            avg_latency_ms: self.avg_latency_ms(),
            min_latency_ms: {
                let v = self.min_latency_ns.load(Ordering::Relaxed);
                if v == u64::MAX { 0.0 } else { v as f64 / 1_000_000.0 }
            },
            max_latency_ms: self.max_latency_ms(),
            top_event_types: top_k(&distribution, 10),
            trend: self.detect_trend(),
            anomalies: self.detect_anomalies(),
            algedonic_pain_count: self.algedonic.lock().unwrap().pain_count,
            algedonic_pleasure_count: self.algedonic.lock().unwrap().pleasure_count,
        };
        drop(distribution);
        *self.dashboard_cache.lock().unwrap() = Some((now, snapshot.clone()));
        snapshot
    }
}
