// SPDX-License-Identifier: MIT OR Apache-2.0

use super::message::{Priority, ScoredMessage};
use super::window::AttentionWindow;
use crate::core::config::AttentionWeights;
use crate::core::util::hash::fingerprint;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreComponents {
    pub novelty: f64,
    pub urgency: f64,
    pub relevance: f64,
    pub intensity: f64,
    pub coherence: f64,
}

/// An association learned from repeated message types, contributing to coherence.
#[derive(Debug, Clone)]
pub struct LearnedAssociation {
    pub message_type: String,
    pub strength: f64,
}

/// SHA-256 over the canonical `(type, source, target)` tuple, truncated to 16
/// hex characters. Same fingerprinting idiom as `correlation_id` (§4.6.1).
pub fn content_hash(msg: &ScoredMessage) -> String {
    fingerprint(&[&msg.message_type, &msg.source, &msg.target], 16)
}

fn score_novelty(windows: &[&AttentionWindow; 4], hash: &str) -> f64 {
    windows
        .iter()
        .map(|w| {
            let count = w.count_matching(hash);
            (-0.5 * count as f64).exp()
        })
        .product()
}

fn score_urgency(msg: &ScoredMessage) -> f64 {
    match msg.priority {
        Priority::Critical => return 1.0,
        Priority::High => return 0.8,
        Priority::Normal => {}
    }
    if let Some(ms) = msg.deadline_ms_from_now {
        return 1.0 - (ms as f64 / 60_000.0).clamp(0.0, 1.0);
    }
    if matches!(msg.message_type.as_str(), "alarm" | "alert" | "emergency") {
        return 0.9;
    }
    0.3
}

fn score_relevance(context_weight: f64, focus_similarity: f64, conversation_continuity: f64) -> f64 {
    let base = context_weight.max(focus_similarity).max(conversation_continuity);
    if conversation_continuity > 0.3 {
        (base + 0.2).min(1.0)
    } else {
        base
    }
}

fn score_intensity(msg: &ScoredMessage) -> f64 {
    let mut v = 0.5;
    if msg.volume_high {
        v += 0.2;
    }
    if msg.repeat_count > 3 {
        v += 0.1;
    }
    if msg.source_authority_high {
        v += 0.15;
    }
    if msg.field_count > 10 {
        v += 0.05;
    }
    v.min(1.0)
}

fn score_coherence(msg: &ScoredMessage, learned: &[LearnedAssociation]) -> f64 {
    learned
        .iter()
        .filter(|a| a.message_type == msg.message_type)
        .map(|a| a.strength)
        .sum::<f64>()
        .clamp(0.0, 1.0)
}

pub fn score_components(
    msg: &ScoredMessage,
    windows: &[&AttentionWindow; 4],
    hash: &str,
    context_weight: f64,
    focus_similarity: f64,
    conversation_continuity: f64,
    learned: &[LearnedAssociation],
) -> ScoreComponents {
    ScoreComponents {
        novelty: score_novelty(windows, hash),
        urgency: score_urgency(msg),
        relevance: score_relevance(context_weight, focus_similarity, conversation_continuity),
        intensity: score_intensity(msg),
        coherence: score_coherence(msg, learned),
    }
}

pub fn weighted_score(weights: &AttentionWeights, c: &ScoreComponents) -> f64 {
    weights.novelty * c.novelty
        + weights.urgency * c.urgency
        + weights.relevance * c.relevance
        + weights.intensity * c.intensity
        + weights.coherence * c.coherence
}

/// Similarity between a message's content hash and the current focus token.
/// Both are hex digests; similarity is the fraction of matching nibbles at
/// equal positions, a cheap deterministic proxy in the absence of the
/// original embedding space.
pub fn focus_similarity(hash: &str, focus_token: &str) -> f64 {
    if hash == focus_token {
        return 1.0;
    }
    let matching = hash
        .chars()
        .zip(focus_token.chars())
        .filter(|(a, b)| a == b)
        .count();
    let len = hash.len().max(focus_token.len()).max(1);
    matching as f64 / len as f64
}
