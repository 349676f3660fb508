// SPDX-License-Identifier: MIT OR Apache-2.0

//! Coordinator (C7): arbitrates every inter-component message, consulting the
//! Attention Engine for scores and applying filtering, conflict resolution,
//! rate limiting, synchronization gating and oscillation damping.

pub mod conflict;
pub mod oscillation;
pub mod rate_limit;
pub mod sync;

use crate::core::analytics::{Analytics, Subsystem};
use crate::core::attention::{AttentionEngine, ScoredMessage};
use crate::core::broker::{topics, Broker, Envelope};
use crate::core::config::CoordinatorConfig;
use crate::core::event::{Causality, Value};
use crate::core::exception::CoordinatorError;
use conflict::{conflict_delay_ms, ConflictKind, ConflictRecord};
use oscillation::OscillationDamper;
use rate_limit::{RateDecision, RateLimiter};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use sync::{aligned_state, build_sync_result, ContextAck, SyncResult};
use tracing::{info, warn};

pub use sync::SyncStatus;

#[derive(Debug, Clone)]
pub struct RouteOutcome {
    pub attention_score: f64,
    pub synchronized: bool,
    pub conflict: Option<ConflictKind>,
    pub delayed_ms: u64,
}

struct RecentFlow {
    from: String,
    to: String,
    at_ms: u64,
}

pub struct Coordinator {
    attention: Arc<AttentionEngine>,
    broker: Arc<dyn Broker>,
    analytics: Arc<Analytics>,
    config: CoordinatorConfig,
    oscillation: Mutex<OscillationDamper>,
    rate_limiter: Mutex<RateLimiter>,
    last_target_delivery: Mutex<HashMap<String, u64>>,
    recent_flows: Mutex<VecDeque<RecentFlow>>,
    locked_resources: Mutex<HashSet<String>>,
    sync_required_types: HashSet<String>,
    filtered_count: AtomicU64,
    bypass_count: AtomicU64,
    conflict_history: Mutex<VecDeque<ConflictRecord>>,
    node_id: String,
}

const CONFLICT_HISTORY_CAP: usize = 1000;

impl Coordinator {
    pub fn new(
        attention: Arc<AttentionEngine>,
        broker: Arc<dyn Broker>,
        analytics: Arc<Analytics>,
        config: CoordinatorConfig,
        node_id: impl Into<String>,
    ) -> Self {
        Self {
            attention,
            broker,
            analytics,
            config,
            oscillation: Mutex::new(OscillationDamper::new()),
            rate_limiter: Mutex::new(RateLimiter::new()),
            last_target_delivery: Mutex::new(HashMap::new()),
            recent_flows: Mutex::new(VecDeque::new()),
            locked_resources: Mutex::new(HashSet::new()),
            sync_required_types: HashSet::new(),
            filtered_count: AtomicU64::new(0),
            bypass_count: AtomicU64::new(0),
            conflict_history: Mutex::new(VecDeque::new()),
            node_id: node_id.into(),
        }
    }

    pub fn conflict_history(&self) -> Vec<ConflictRecord> {
        self.conflict_history.lock().unwrap().iter().cloned().collect()
    }

    pub fn require_sync_for(&mut self, message_type: impl Into<String>) {
        self.sync_required_types.insert(message_type.into());
    }

    pub fn lock_resource(&self, resource: &str) {
        self.locked_resources.lock().unwrap().insert(resource.to_string());
    }

    pub fn unlock_resource(&self, resource: &str) {
        self.locked_resources.lock().unwrap().remove(resource);
    }

    pub fn filtered_count(&self) -> u64 {
        self.filtered_count.load(Ordering::Relaxed)
    }

    pub fn bypass_count(&self) -> u64 {
        self.bypass_count.load(Ordering::Relaxed)
    }

    fn detect_conflict(&self, from: &str, to: &str, msg: &ScoredMessage, now_ms: u64) -> Option<ConflictKind> {
        if let Some(last) = self.last_target_delivery.lock().unwrap().get(to) {
            if now_ms.saturating_sub(*last) <= self.config.simultaneous_access_window_ms {
                return Some(ConflictKind::SimultaneousAccess);
            }
        }
        let reverse_exists = self
            .recent_flows
            .lock()
            .unwrap()
            .iter()
            .any(|f| f.from == to && f.to == from);
        if reverse_exists {
            return Some(ConflictKind::CircularDependency);
        }
        if msg.message_type == "resource_request" && self.locked_resources.lock().unwrap().contains(to) {
            return Some(ConflictKind::ResourceContention);
        }
        None
    }

    fn record_flow(&self, from: &str, to: &str, now_ms: u64) {
        let mut flows = self.recent_flows.lock().unwrap();
        flows.push_back(RecentFlow { from: from.to_string(), to: to.to_string(), at_ms: now_ms });
        while flows.len() > 1000 {
            flows.pop_front();
        }
        while let Some(front) = flows.front() {
            if now_ms.saturating_sub(front.at_ms) > 60_000 {
                flows.pop_front();
            } else {
                break;
            }
        }
    }

    /// Routes a single `(from, to, message)` through scoring, filtering,
    /// conflict resolution, rate limiting and synchronization gating, then
    /// forwards it to the target's inbox topic over the broker (§4.7).
    pub async fn route(
        &self,
        from: &str,
        to: &str,
        msg: ScoredMessage,
        context_id: Option<&str>,
        causality: Causality,
        now_ms: u64,
    ) -> Result<RouteOutcome, CoordinatorError> {
        let scored = self.attention.score(&msg, context_id, now_ms);
        let score = scored.attention_score;

        if score < self.config.low_attention_threshold {
            self.filtered_count.fetch_add(1, Ordering::Relaxed);
            return Err(CoordinatorError::LowAttention { score, threshold: self.config.low_attention_threshold });
        }

        let mut delayed_ms = 0u64;
        let conflict_kind = self.detect_conflict(from, to, &msg, now_ms);
        if let Some(kind) = conflict_kind {
            let delay = conflict_delay_ms(score);
            delayed_ms += delay;
            tokio::time::sleep(Duration::from_millis(delay)).await;
            warn!(flow_from = from, flow_to = to, kind = %kind, delay_ms = delay, "coordinator conflict resolved");
            self.analytics.record_subsystem_violation(Subsystem::S2);
            let mut history = self.conflict_history.lock().unwrap();
            history.push_back(ConflictRecord { kind, from: from.to_string(), to: to.to_string(), delayed_ms: delay, resolved_at_ms: now_ms + delay });
            if history.len() > CONFLICT_HISTORY_CAP {
                history.pop_front();
            }
        }

        let decision = self.rate_limiter.lock().unwrap().check(from, to, score, self.config.base_rate_per_sec, self.config.bypass_threshold, now_ms);
        match decision {
            RateDecision::Allow => {}
            RateDecision::Bypass => {
                self.bypass_count.fetch_add(1, Ordering::Relaxed);
                self.analytics.record_subsystem_override(Subsystem::S2);
            }
            RateDecision::Delay { delayed_ms: ms } => {
                delayed_ms += ms;
                tokio::time::sleep(Duration::from_millis(ms)).await;
                return Err(CoordinatorError::RateLimited { delayed_ms: ms });
            }
        }

        let synchronized = self.sync_required_types.contains(&msg.message_type) || score > self.config.sync_threshold;

        self.last_target_delivery.lock().unwrap().insert(to.to_string(), now_ms);
        self.record_flow(from, to, now_ms);

        let mut payload = Value::Map(Default::default());
        if let Value::Map(ref mut m) = payload {
            m.insert("message_type".into(), Value::String(msg.message_type.clone()));
            m.insert("from".into(), Value::String(from.to_string()));
            m.insert("to".into(), Value::String(to.to_string()));
            m.insert("attention_score".into(), Value::Float(score));
            m.insert("synchronized".into(), Value::Bool(synchronized));
        }
        self.broker
            .publish(&topics::context_topic(to), payload, causality)
            .await
            .map_err(|_| CoordinatorError::SyncTimeout)?;

        info!(flow_from = from, flow_to = to, score, synchronized, "coordinator forwarded message");

        Ok(RouteOutcome { attention_score: score, synchronized, conflict: conflict_kind, delayed_ms })
    }

    /// Applies the oscillation damper to a numeric signal on a flow.
    pub fn dampen_signal(&self, from: &str, to: &str, value: f64, score: f64, now_ms: u64) -> (f64, bool) {
        let outcome = self.oscillation.lock().unwrap().observe(
            from,
            to,
            value,
            score,
            now_ms,
            self.config.oscillation_window_ms,
            self.config.oscillation_threshold,
            self.config.oscillation_crisis_count,
        );
        if outcome.crisis {
            self.attention.shift_attention(format!("oscillation_crisis:{from}->{to}"), now_ms);
        }
        (OscillationDamper::dampen(value, outcome.dampening_factor), outcome.oscillating)
    }

    /// Synchronization protocol (§4.7): emit a sync request to each context,
    /// collect acks (bounded by `sync_ack_timeout_ms`), compute the aligned
    /// state by latest timestamp, and broadcast it to laggards.
    pub async fn synchronize_operations(&self, contexts: &[String], acks: Vec<ContextAck>, started_at_ms: u64, now_ms: u64, action_success_rate: f64) -> SyncResult {
        let id = crate::core::util::hash::fingerprint(&[&contexts.join(","), &started_at_ms.to_string()], 16);
        let elapsed = Duration::from_millis(now_ms.saturating_sub(started_at_ms));
        let timeout = Duration::from_millis(self.config.sync_ack_timeout_ms);

        if let Some(aligned) = aligned_state(&acks) {
            let laggards: Vec<&ContextAck> = acks.iter().filter(|a| a.state_fingerprint != aligned.state_fingerprint).collect();
            for laggard in laggards {
                let mut payload = Value::Map(Default::default());
                if let Value::Map(ref mut m) = payload {
                    m.insert("aligned_state".into(), Value::String(aligned.state_fingerprint.clone()));
                }
                let _ = self
                    .broker
                    .publish(&topics::context_topic(&laggard.context_id), payload, Causality::root(self.node_id.clone()))
                    .await;
            }
        }

        let result = build_sync_result(id, contexts, &acks, elapsed, timeout, action_success_rate);
        let missing_contexts = result.per_context.iter().filter(|(_, responded)| !responded).count();
        for _ in 0..missing_contexts {
            self.analytics.record_subsystem_timeout(Subsystem::S2);
        }
        result
    }
}
