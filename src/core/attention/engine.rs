// SPDX-License-Identifier: MIT OR Apache-2.0

use super::message::ScoredMessage;
use super::scoring::{self, LearnedAssociation, ScoreComponents};
use super::state::AttentionState;
use super::window::{AttentionWindow, TemporalScale, WindowEntry};
use crate::core::config::AttentionConfig;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

const HIGH_SALIENCE_CAP: usize = 100;
const SHIFT_FOCUS_STABILIZE_MS: u64 = 100;

#[derive(Debug, Clone)]
pub struct ScoredOutcome {
    pub attention_score: f64,
    pub components: ScoreComponents,
    pub content_hash: String,
}

struct Inner {
    state: AttentionState,
    fatigue: f64,
    current_focus: Option<String>,
    shifting_until_ms: Option<u64>,
    windows: HashMap<TemporalScale, AttentionWindow>,
    context_weights: HashMap<String, f64>,
    recent_flows: VecDeque<(String, String)>,
    learned: Vec<LearnedAssociation>,
    running_avg: f64,
    observations: u64,
    high_salience: VecDeque<(f64, String)>,
}

impl Inner {
    fn window_for(&mut self, scale: TemporalScale) -> &mut AttentionWindow {
        self.windows.entry(scale).or_insert_with(AttentionWindow::new)
    }
}

/// Multi-dimensional salience scorer (C6). Serializes all internal state
/// updates behind a single mutex, mirroring the mailbox-style serialization
/// every other component gets from its channel (§5).
pub struct AttentionEngine {
    config: AttentionConfig,
    inner: Mutex<Inner>,
}

impl AttentionEngine {
    pub fn new(config: AttentionConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(Inner {
                state: AttentionState::default(),
                fatigue: 0.0,
                current_focus: None,
                shifting_until_ms: None,
                windows: HashMap::new(),
                context_weights: HashMap::new(),
                recent_flows: VecDeque::new(),
                learned: Vec::new(),
                running_avg: 0.0,
                observations: 0,
                high_salience: VecDeque::new(),
            }),
        }
    }

    pub fn learn_association(&self, message_type: impl Into<String>, strength: f64) {
        self.inner.lock().unwrap().learned.push(LearnedAssociation {
            message_type: message_type.into(),
            strength,
        });
    }

    pub fn bump_context_weight(&self, context_id: &str, delta: f64) {
        let mut inner = self.inner.lock().unwrap();
        let w = inner.context_weights.entry(context_id.to_string()).or_insert(0.0);
        *w = (*w + delta).clamp(0.0, 1.0);
    }

    /// Scores a message on the five dimensions and folds in the side effects
    /// (window append above threshold, running average, high-salience top-K).
    pub fn score(&self, msg: &ScoredMessage, context_id: Option<&str>, now_ms: u64) -> ScoredOutcome {
        let mut inner = self.inner.lock().unwrap();
        let hash = scoring::content_hash(msg);

        for scale in TemporalScale::all() {
            inner.window_for(scale).evict(now_ms, scale);
        }

        let context_weight = context_id
            .and_then(|id| inner.context_weights.get(id).copied())
            .unwrap_or(0.0);
        let focus_similarity = match inner.current_focus.clone() {
            Some(focus) => scoring::focus_similarity(&hash, &focus),
            None => 0.5,
        };
        let conversation_continuity = {
            let pair = (msg.source.clone(), msg.target.clone());
            let matches = inner.recent_flows.iter().filter(|f| **f == pair).count();
            if inner.recent_flows.is_empty() {
                0.0
            } else {
                matches as f64 / inner.recent_flows.len() as f64
            }
        };

        for scale in TemporalScale::all() {
            inner.windows.entry(scale).or_insert_with(AttentionWindow::new);
        }
        let scales = TemporalScale::all();
        let windows_arr: [&AttentionWindow; 4] = [
            inner.windows.get(&scales[0]).unwrap(),
            inner.windows.get(&scales[1]).unwrap(),
            inner.windows.get(&scales[2]).unwrap(),
            inner.windows.get(&scales[3]).unwrap(),
        ];
        let learned = inner.learned.clone();
        let components = scoring::score_components(
            msg,
            &windows_arr,
            &hash,
            context_weight,
            focus_similarity,
            conversation_continuity,
            &learned,
        );

        let weighted = scoring::weighted_score(&self.config.weights, &components);
        let state = inner.state;
        let fatigue = inner.fatigue;
        let score = (weighted * state.multiplier() * (1.0 - 0.5 * fatigue)).clamp(0.0, 1.0);

        if score > self.config.append_threshold {
            for scale in TemporalScale::all() {
                let entry = WindowEntry { arrival_time_ms: now_ms, score, content_hash: hash.clone() };
                inner.window_for(scale).push(entry, now_ms, scale);
            }
        }

        inner.observations += 1;
        let n = inner.observations as f64;
        inner.running_avg += (score - inner.running_avg) / n;
        if score > self.config.high_salience_threshold {
            inner.high_salience.push_back((score, hash.clone()));
            if inner.high_salience.len() > HIGH_SALIENCE_CAP {
                inner.high_salience.pop_front();
            }
        }

        inner.recent_flows.push_back((msg.source.clone(), msg.target.clone()));
        if inner.recent_flows.len() > 1000 {
            inner.recent_flows.pop_front();
        }

        ScoredOutcome { attention_score: score, components, content_hash: hash }
    }

    pub fn running_average(&self) -> f64 {
        self.inner.lock().unwrap().running_avg
    }

    pub fn high_salience_events(&self) -> Vec<(f64, String)> {
        self.inner.lock().unwrap().high_salience.iter().cloned().collect()
    }

    pub fn state(&self) -> AttentionState {
        self.inner.lock().unwrap().state
    }

    pub fn fatigue(&self) -> f64 {
        self.inner.lock().unwrap().fatigue
    }

    pub fn current_focus(&self) -> Option<String> {
        self.inner.lock().unwrap().current_focus.clone()
    }

    /// Cost of shifting focus is `0` for the same token, else
    /// `0.1 + 0.2*(1 - similarity(old, new))` (§4.6). Transitions to
    /// `shifting`, scheduled back to `focused` after 100ms by the caller's
    /// maintenance tick.
    pub fn shift_attention(&self, new_focus: impl Into<String>, now_ms: u64) -> f64 {
        let new_focus = new_focus.into();
        let mut inner = self.inner.lock().unwrap();
        let cost = match &inner.current_focus {
            Some(old) if *old == new_focus => 0.0,
            Some(old) => 0.1 + 0.2 * (1.0 - scoring::focus_similarity(old, &new_focus)),
            None => 0.1 + 0.2 * (1.0 - 0.5),
        };
        inner.current_focus = Some(new_focus);
        inner.state = AttentionState::Shifting;
        inner.shifting_until_ms = Some(now_ms + SHIFT_FOCUS_STABILIZE_MS);
        inner.fatigue = (inner.fatigue + cost).min(1.0);
        cost
    }

    /// Maintenance tick (fires every 1s): fatigue decay, context memory decay,
    /// window sweep, state transitions (§4.6).
    pub fn tick(&self, now_ms: u64) {
        let mut inner = self.inner.lock().unwrap();
        inner.fatigue = (inner.fatigue - self.config.fatigue_decay_per_tick).max(0.0);

        let decay = self.config.context_decay_factor;
        inner.context_weights.retain(|_, w| {
            *w *= decay;
            *w >= 0.01
        });

        for scale in TemporalScale::all() {
            inner.window_for(scale).evict(now_ms, scale);
        }

        if let Some(until) = inner.shifting_until_ms {
            if now_ms >= until && inner.state == AttentionState::Shifting {
                inner.state = AttentionState::Focused;
                inner.shifting_until_ms = None;
            }
        }

        let fatigue = inner.fatigue;
        let was_fatigued = inner.state == AttentionState::Fatigued;
        if fatigue > 0.7 {
            inner.state = AttentionState::Fatigued;
        } else if was_fatigued && fatigue < 0.2 {
            inner.state = AttentionState::Recovering;
        } else if inner.state == AttentionState::Recovering && fatigue < 0.1 {
            inner.state = AttentionState::Distributed;
        }
    }

    /// Scores every message and keeps those at or above `threshold`, sorted
    /// by score descending (§4.6).
    pub fn filter(&self, messages: &[(ScoredMessage, Option<String>)], threshold: f64, now_ms: u64) -> Vec<(ScoredMessage, ScoredOutcome)> {
        let mut scored: Vec<(ScoredMessage, ScoredOutcome)> = messages
            .iter()
            .map(|(m, ctx)| {
                let outcome = self.score(m, ctx.as_deref(), now_ms);
                (m.clone(), outcome)
            })
            .filter(|(_, o)| o.attention_score >= threshold)
            .collect();
        scored.sort_by(|a, b| b.1.attention_score.partial_cmp(&a.1.attention_score).unwrap());
        scored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::attention::message::Priority;

    fn engine() -> AttentionEngine {
        AttentionEngine::new(AttentionConfig::default())
    }

    #[test]
    fn critical_priority_scores_higher_than_low_priority_default() {
        let e = engine();
        let critical = ScoredMessage::new("t", "a", "b").with_priority(Priority::Critical);
        let normal = ScoredMessage::new("other", "a", "b");
        let c = e.score(&critical, None, 0);
        let n = e.score(&normal, None, 0);
        assert!(c.attention_score > n.attention_score);
    }

    #[test]
    fn repeated_identical_messages_reduce_novelty_and_thus_score() {
        let e = engine();
        let msg = ScoredMessage::new("repeat.me", "a", "b").with_priority(Priority::Critical);
        let first = e.score(&msg, None, 0);
        let second = e.score(&msg, None, 10);
        assert!(second.components.novelty <= first.components.novelty);
    }

    #[test]
    fn shift_attention_transitions_to_shifting_and_adds_fatigue() {
        let e = engine();
        let cost = e.shift_attention("focus-a", 0);
        assert!(cost > 0.0);
        assert_eq!(e.state(), AttentionState::Shifting);
        assert!(e.fatigue() > 0.0);
    }

    #[test]
    fn tick_returns_to_focused_after_stabilize_window() {
        let e = engine();
        e.shift_attention("focus-a", 0);
        e.tick(50);
        assert_eq!(e.state(), AttentionState::Shifting);
        e.tick(150);
        assert_eq!(e.state(), AttentionState::Focused);
    }

    #[test]
    fn high_fatigue_transitions_to_fatigued_state() {
        let e = engine();
        for i in 0..10 {
            e.shift_attention(format!("focus-{i}"), i * 10);
        }
        e.tick(200);
        assert_eq!(e.state(), AttentionState::Fatigued);
    }

    #[test]
    fn filter_keeps_only_messages_at_or_above_threshold_sorted_descending() {
        let e = engine();
        let msgs = vec![
            (ScoredMessage::new("alarm", "a", "b"), None),
            (ScoredMessage::new("quiet", "a", "b"), None),
        ];
        let kept = e.filter(&msgs, 0.5, 0);
        assert!(kept.iter().all(|(_, o)| o.attention_score >= 0.5));
        for w in kept.windows(2) {
            assert!(w[0].1.attention_score >= w[1].1.attention_score);
        }
    }
}
