// SPDX-License-Identifier: MIT OR Apache-2.0

use std::collections::{HashMap, VecDeque};

/// Per-flow sliding 1s request counter used to approximate a rate in
/// requests/sec without a token-bucket's extra state (§4.7).
#[derive(Default)]
pub struct RateLimiter {
    flows: HashMap<(String, String), VecDeque<u64>>,
}

pub enum RateDecision {
    Allow,
    Bypass,
    Delay { delayed_ms: u64 },
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Effective limit is `base * (1 + score)`. Over limit and score above
    /// `bypass_threshold` bypasses; otherwise delay `100 * (2 - score)` ms (§4.7).
    pub fn check(&mut self, from: &str, to: &str, score: f64, base_rate_per_sec: f64, bypass_threshold: f64, now_ms: u64) -> RateDecision {
        let key = (from.to_string(), to.to_string());
        let history = self.flows.entry(key).or_default();
        while let Some(front) = history.front() {
            if now_ms.saturating_sub(*front) > 1_000 {
                history.pop_front();
            } else {
                break;
            }
        }
        history.push_back(now_ms);

        let effective_limit = base_rate_per_sec * (1.0 + score);
        if (history.len() as f64) <= effective_limit {
            return RateDecision::Allow;
        }
        if score > bypass_threshold {
            RateDecision::Bypass
        } else {
            RateDecision::Delay { delayed_ms: (100.0 * (2.0 - score)) as u64 }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn under_limit_allows() {
        let mut r = RateLimiter::new();
        assert!(matches!(r.check("a", "b", 0.5, 100.0, 0.8, 0), RateDecision::Allow));
    }

    #[test]
    fn over_limit_with_high_score_bypasses() {
        let mut r = RateLimiter::new();
        for i in 0..5 {
            r.check("a", "b", 0.9, 1.0, 0.8, i);
        }
        assert!(matches!(r.check("a", "b", 0.9, 1.0, 0.8, 5), RateDecision::Bypass));
    }

    #[test]
    fn over_limit_with_low_score_delays() {
        let mut r = RateLimiter::new();
        for i in 0..5 {
            r.check("a", "b", 0.1, 1.0, 0.8, i);
        }
        assert!(matches!(r.check("a", "b", 0.1, 1.0, 0.8, 5), RateDecision::Delay { .. }));
    }
}
