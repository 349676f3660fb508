// SPDX-License-Identifier: MIT OR Apache-2.0

use super::builtin::builtin_specs;
use super::pattern_match::PatternMatch;
use super::spec::{PatternSpec, Severity};
use super::window::SlidingWindow;
use crate::core::analytics::Analytics;
use crate::core::broker::ActionDispatcher;
use crate::core::event::{Causality, Event, Metadata, NewEvent, Value};
use crate::core::store::{EventStore, ExpectedVersion};
use crate::core::util::monotonic_now_ms;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex};

const HISTORY_CAPACITY: usize = 100;
const MIN_RELEVANT: usize = 2;

/// Reserved stream the full, durable pattern-match history is appended to;
/// `history()` below only returns the in-memory cap-100 ring (§3).
pub const PATTERN_HISTORY_STREAM: &str = "__pattern_history";

/// Sliding-window CEP matcher (C4): evaluates configured specs against a
/// time-bounded event buffer and dispatches matched action tags.
pub struct PatternMatcher {
    window: Mutex<SlidingWindow>,
    specs: Mutex<Vec<PatternSpec>>,
    history: Mutex<VecDeque<PatternMatch>>,
    dispatcher: Arc<dyn ActionDispatcher>,
    store: Arc<EventStore>,
    analytics: Arc<Analytics>,
    node_id: String,
}

impl PatternMatcher {
    pub fn new(
        window_ms: u64,
        window_capacity: usize,
        dispatcher: Arc<dyn ActionDispatcher>,
        store: Arc<EventStore>,
        analytics: Arc<Analytics>,
        node_id: impl Into<String>,
    ) -> Self {
        Self {
            window: Mutex::new(SlidingWindow::new(window_ms, window_capacity)),
            specs: Mutex::new(builtin_specs()),
            history: Mutex::new(VecDeque::new()),
            dispatcher,
            store,
            analytics,
            node_id: node_id.into(),
        }
    }

    pub fn add_spec(&self, spec: PatternSpec) {
        self.specs.lock().unwrap().push(spec);
    }

    fn evaluate_spec(&self, spec: &PatternSpec, now_ms: u64) -> Option<PatternMatch> {
        let window = self.window.lock().unwrap();
        let window_ms = window.window_ms();
        let relevant: Vec<(u64, Event)> = window
            .events_with_age(now_ms)
            .into_iter()
            .filter(|(age, e)| *age <= window_ms && spec.matches_event_type(&e.event_type))
            .map(|(age, e)| (age, e.clone()))
            .collect();
        drop(window);

        if relevant.len() < MIN_RELEVANT {
            return None;
        }
        let events: Vec<Event> = relevant.iter().map(|(_, e)| e.clone()).collect();
        if !(spec.predicate)(&events) {
            return None;
        }

        let avg_recency: f64 = relevant
            .iter()
            .map(|(age, _)| (1.0 - (*age as f64 / window_ms as f64)).clamp(0.0, 1.0))
            .sum::<f64>()
            / relevant.len() as f64;
        let count_term = (relevant.len() as f64 / 5.0).min(1.0);
        let confidence = (avg_recency + count_term) / 2.0;

        Some(PatternMatch {
            pattern_name: spec.name.clone(),
            severity: spec.severity,
            action_tag: spec.action_tag.clone(),
            matched_events: events,
            confidence,
            timestamp: crate::core::util::wall_clock_now(),
        })
    }

    fn record(&self, m: PatternMatch) {
        let record = NewEvent::new("pattern_match.recorded", pattern_match_value(&m));
        let _ = self.store.append(PATTERN_HISTORY_STREAM, ExpectedVersion::Any, vec![record], Metadata::new());

        let mut history = self.history.lock().unwrap();
        history.push_back(m);
        while history.len() > HISTORY_CAPACITY {
            history.pop_front();
        }
    }

    async fn act_on(&self, m: PatternMatch) {
        let payload = Value::String(format!("{}::{}", m.pattern_name, m.confidence));
        let causality = Causality::root(self.node_id.clone());
        self.dispatcher.dispatch(&m.action_tag, payload, causality).await;
        if m.severity == Severity::Critical {
            self.analytics.record_algedonic(true, m.confidence);
        }
        self.record(m);
    }

    /// Adds `event` to the window and evaluates only critical specs immediately.
    pub async fn check_critical(&self, event: Event) {
        let now = monotonic_now_ms();
        self.window.lock().unwrap().push(event, now);
        let specs: Vec<PatternSpec> = self
            .specs
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.severity == Severity::Critical)
            .cloned()
            .collect();
        for spec in &specs {
            if let Some(m) = self.evaluate_spec(spec, now) {
                self.act_on(m).await;
            }
        }
    }

    /// Adds `event` to the window; evaluation is deferred to the next
    /// `process_events`/`flush_standard` call.
    pub fn check_standard(&self, event: Event) {
        let now = monotonic_now_ms();
        self.window.lock().unwrap().push(event, now);
    }

    /// Evaluates every configured spec once against the current window state.
    pub async fn flush_standard(&self) {
        let now = monotonic_now_ms();
        let specs: Vec<PatternSpec> = self.specs.lock().unwrap().clone();
        for spec in &specs {
            if let Some(m) = self.evaluate_spec(spec, now) {
                self.act_on(m).await;
            }
        }
    }

    /// Adds an entire batch, then evaluates every spec exactly once (§4.4).
    pub async fn process_events(&self, events: Vec<Event>) {
        let now = monotonic_now_ms();
        {
            let mut window = self.window.lock().unwrap();
            for event in events {
                window.push(event, now);
            }
        }
        let specs: Vec<PatternSpec> = self.specs.lock().unwrap().clone();
        for spec in &specs {
            if let Some(m) = self.evaluate_spec(spec, now) {
                self.act_on(m).await;
            }
        }
    }

    pub fn history(&self) -> Vec<PatternMatch> {
        self.history.lock().unwrap().iter().cloned().collect()
    }

    /// Extracts contiguous 3-event-type sequences from `history_events`; any
    /// sequence seen >= 5 times becomes a synthetic spec requiring all three
    /// types present in the window (§4.4 learning mode).
    pub fn learn_from_history(&self, history_events: &[Event]) -> Vec<PatternSpec> {
        if history_events.len() < 3 {
            return Vec::new();
        }
        let mut counts: HashMap<(String, String, String), u32> = HashMap::new();
        for window in history_events.windows(3) {
            let key = (
                window[0].event_type.clone(),
                window[1].event_type.clone(),
                window[2].event_type.clone(),
            );
            *counts.entry(key).or_insert(0) += 1;
        }
        counts
            .into_iter()
            .filter(|(_, count)| *count >= 5)
            .map(|((a, b, c), _)| {
                let name = format!("learned_{a}_{b}_{c}");
                let globs = vec![a.clone(), b.clone(), c.clone()];
                let predicate_types = (a, b, c);
                PatternSpec::new_builtin(
                    name,
                    globs.iter().map(String::as_str).collect(),
                    Arc::new(move |events: &[Event]| {
                        let (a, b, c) = &predicate_types;
                        let has = |t: &str| events.iter().any(|e| &e.event_type == t);
                        has(a) && has(b) && has(c)
                    }),
                    Severity::Info,
                    "learned_pattern_observed",
                )
            })
            .collect()
    }
}

/// Renders a `PatternMatch` for durable storage in `__pattern_history` —
/// matched event ids rather than full events, since the events themselves
/// are already durable in their own streams.
fn pattern_match_value(m: &PatternMatch) -> Value {
    let mut fields = BTreeMap::new();
    fields.insert("pattern_name".to_string(), Value::String(m.pattern_name.clone()));
    fields.insert("severity".to_string(), Value::String(m.severity.as_str().to_string()));
    fields.insert("action_tag".to_string(), Value::String(m.action_tag.clone()));
    fields.insert("confidence".to_string(), Value::Float(m.confidence));
    fields.insert("timestamp".to_string(), Value::String(m.timestamp.to_rfc3339()));
    fields.insert(
        "matched_event_ids".to_string(),
        Value::List(m.matched_events.iter().map(|e| Value::String(e.id.to_string())).collect()),
    );
    Value::Map(fields)
}

impl Clone for PatternSpec {
    fn clone(&self) -> Self {
        PatternSpec {
            name: self.name.clone(),
            event_type_globs: self.event_type_globs.clone(),
            predicate: Arc::clone(&self.predicate),
            severity: self.severity,
            action_tag: self.action_tag.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::broker::{ActionDispatcher, InProcessBroker, BroadcastDispatcher};
    use chrono::Utc;
    use uuid::Uuid;

    fn event(event_type: &str) -> Event {
        Event {
            id: Uuid::new_v4(),
            stream_id: "s".into(),
            stream_version: 1,
            global_position: 1,
            event_type: event_type.into(),
            payload: Value::Null,
            metadata: Default::default(),
            correlation_id: None,
            causation_id: None,
            timestamp: Utc::now(),
            causality: None,
        }
    }

    fn matcher() -> PatternMatcher {
        let broker = Arc::new(InProcessBroker::new("node-a", 16));
        let dispatcher: Arc<dyn ActionDispatcher> = Arc::new(BroadcastDispatcher::new(broker, "node-a"));
        let store = Arc::new(EventStore::new(Arc::new(crate::core::persistence::InMemoryBackend::new())));
        let analytics = Arc::new(Analytics::new());
        PatternMatcher::new(30_000, 1000, dispatcher, store, analytics, "node-a")
    }

    #[tokio::test]
    async fn variety_imbalance_scenario_matches_with_confidence_at_least_point_six() {
        let m = matcher();
        for _ in 0..7 {
            m.check_standard(event("variety.amplified"));
        }
        m.check_standard(event("variety.filtered"));
        m.flush_standard().await;
        let history = m.history();
        let found = history.iter().find(|p| p.pattern_name == "variety_imbalance").unwrap();
        assert!(found.confidence >= 0.6);
        assert_eq!(found.action_tag, "rebalance_variety");
    }

    #[tokio::test]
    async fn matched_patterns_are_durably_appended_to_pattern_history_stream() {
        let broker = Arc::new(InProcessBroker::new("node-a", 16));
        let dispatcher: Arc<dyn ActionDispatcher> = Arc::new(BroadcastDispatcher::new(broker, "node-a"));
        let store = Arc::new(EventStore::new(Arc::new(crate::core::persistence::InMemoryBackend::new())));
        let analytics = Arc::new(Analytics::new());
        let m = PatternMatcher::new(30_000, 1000, dispatcher, Arc::clone(&store), analytics, "node-a");

        for _ in 0..7 {
            m.check_standard(event("variety.amplified"));
        }
        m.check_standard(event("variety.filtered"));
        m.flush_standard().await;

        let durable = store.read_stream(PATTERN_HISTORY_STREAM, 0, 100);
        assert!(durable.iter().any(|e| e
            .payload
            .get("pattern_name")
            .and_then(Value::as_str)
            == Some("variety_imbalance")));
    }

    #[tokio::test]
    async fn check_critical_evaluates_only_critical_specs() {
        let m = matcher();
        m.check_critical(event("algedonic.pain.detected")).await;
        m.check_critical(event("system3.health.degraded")).await;
        m.check_critical(event("system4.health.degraded")).await;
        let history = m.history();
        assert!(history.iter().any(|p| p.pattern_name == "algedonic_cascade"));
    }

    #[tokio::test]
    async fn critical_matches_register_algedonic_pain() {
        let broker = Arc::new(InProcessBroker::new("node-a", 16));
        let dispatcher: Arc<dyn ActionDispatcher> = Arc::new(BroadcastDispatcher::new(broker, "node-a"));
        let store = Arc::new(EventStore::new(Arc::new(crate::core::persistence::InMemoryBackend::new())));
        let analytics = Arc::new(Analytics::new());
        let m = PatternMatcher::new(30_000, 1000, dispatcher, store, Arc::clone(&analytics), "node-a");

        m.check_critical(event("algedonic.pain.detected")).await;
        m.check_critical(event("system3.health.degraded")).await;
        m.check_critical(event("system4.health.degraded")).await;

        let snapshot = analytics.dashboard_snapshot(std::time::Instant::now());
        assert!(snapshot.algedonic_pain_count > 0);
    }

    #[tokio::test]
    async fn learning_mode_promotes_sequences_seen_five_times() {
        let m = matcher();
        let mut sequence = Vec::new();
        for _ in 0..5 {
            sequence.push(event("a.one"));
            sequence.push(event("b.two"));
            sequence.push(event("c.three"));
        }
        let learned = m.learn_from_history(&sequence);
        assert!(!learned.is_empty());
    }
}
