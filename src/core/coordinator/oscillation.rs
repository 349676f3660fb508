// SPDX-License-Identifier: MIT OR Apache-2.0

use std::collections::{HashMap, VecDeque};

#[derive(Debug, Clone)]
struct Signal {
    at_ms: u64,
    direction_up: bool,
}

/// Per-flow oscillation tracking over a rolling window (§4.7). Direction
/// changes beyond a threshold (variance over the window, normalized) trigger
/// dampening; repeated oscillation within the window escalates to a crisis.
#[derive(Default)]
pub struct OscillationDamper {
    flows: HashMap<(String, String), VecDeque<Signal>>,
    crisis_counts: HashMap<(String, String), u32>,
}

pub struct OscillationOutcome {
    pub oscillating: bool,
    pub dampening_factor: f64,
    pub crisis: bool,
}

impl OscillationDamper {
    pub fn new() -> Self {
        Self::default()
    }

    fn evict(history: &mut VecDeque<Signal>, now_ms: u64, window_ms: u64) {
        while let Some(front) = history.front() {
            if now_ms.saturating_sub(front.at_ms) > window_ms {
                history.pop_front();
            } else {
                break;
            }
        }
    }

    /// Records a new numeric signal's direction relative to the previous one
    /// and evaluates whether the flow is oscillating. `score` is the
    /// attention score for this message, used to compute the dampening factor.
    pub fn observe(
        &mut self,
        from: &str,
        to: &str,
        value: f64,
        score: f64,
        now_ms: u64,
        window_ms: u64,
        variance_threshold: f64,
        crisis_count: u32,
    ) -> OscillationOutcome {
        let key = (from.to_string(), to.to_string());
        let history = self.flows.entry(key.clone()).or_default();
        Self::evict(history, now_ms, window_ms);

        history.push_back(Signal { at_ms: now_ms, direction_up: value >= 0.0 });

        let direction_changes = history
            .iter()
            .collect::<Vec<_>>()
            .windows(2)
            .filter(|w| w[0].direction_up != w[1].direction_up)
            .count();
        let n = history.len().max(1) as f64;
        let normalized_variance = direction_changes as f64 / n;
        let oscillating = normalized_variance > variance_threshold;

        let mut crisis = false;
        if oscillating {
            let count = self.crisis_counts.entry(key).or_insert(0);
            *count += 1;
            if *count > crisis_count {
                crisis = true;
            }
        } else {
            self.crisis_counts.remove(&(from.to_string(), to.to_string()));
        }

        let dampening_factor = 0.7 + 0.3 * score;
        OscillationOutcome { oscillating, dampening_factor, crisis }
    }

    pub fn dampen(value: f64, factor: f64) -> f64 {
        value * factor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alternating_signals_are_detected_as_oscillating() {
        let mut d = OscillationDamper::new();
        let mut last = OscillationOutcome { oscillating: false, dampening_factor: 1.0, crisis: false };
        for i in 0..10 {
            let value = if i % 2 == 0 { 1.0 } else { -1.0 };
            last = d.observe("a", "b", value, 0.5, i * 100, 5000, 0.3, 5);
        }
        assert!(last.oscillating);
    }

    #[test]
    fn stable_signals_do_not_oscillate() {
        let mut d = OscillationDamper::new();
        let outcome = d.observe("a", "b", 1.0, 0.5, 0, 5000, 0.5, 5);
        assert!(!outcome.oscillating);
    }

    #[test]
    fn dampening_factor_increases_with_attention_score() {
        let low = OscillationDamper::dampen(10.0, 0.7 + 0.3 * 0.1);
        let high = OscillationDamper::dampen(10.0, 0.7 + 0.3 * 0.9);
        assert!(high > low);
    }
}
