// SPDX-License-Identifier: MIT OR Apache-2.0

use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnomalySeverity {
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Anomaly {
    Throughput { severity: AnomalySeverity, deviation_sigma: f64 },
    Latency { ratio_to_mean: f64 },
}

#[derive(Debug, Clone)]
pub struct DashboardSnapshot {
    pub events_processed: u64,
    pub avg_latency_ms: f64,
    pub min_latency_ms: f64,
    pub max_latency_ms: f64,
    pub top_event_types: Vec<(String, u64)>,
    pub trend: Option<Trend>,
    pub anomalies: Vec<Anomaly>,
    pub algedonic_pain_count: u64,
    pub algedonic_pleasure_count: u64,
}

pub fn top_k(distribution: &HashMap<String, u64>, k: usize) -> Vec<(String, u64)> {
    let mut entries: Vec<(String, u64)> = distribution.iter().map(|(t, c)| (t.clone(), *c)).collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    entries.truncate(k);
    entries
}
