// SPDX-License-Identifier: MIT OR Apache-2.0

use super::classify::Lane;
use super::dead_letter::dead_letter;
use super::enrichment::EnrichedMessage;
use crate::core::analytics::Analytics;
use crate::core::broker::{topics, Broker};
use crate::core::event::{Causality, Event, Metadata, NewEvent, Value};
use crate::core::pattern::PatternMatcher;
use crate::core::producer::message::ProducerPayload;
use crate::core::store::{EventStore, ExpectedVersion};
use crate::core::util::monotonic_now_ms;
use std::collections::HashMap;
use std::sync::Arc;

pub struct LaneDeps {
    pub store: Arc<EventStore>,
    pub pattern_matcher: Arc<PatternMatcher>,
    pub analytics: Arc<Analytics>,
    pub broker: Arc<dyn Broker>,
    pub node_id: String,
}

/// Messages ingested without an explicit stream carry their routing stream in
/// metadata; falling back to the event type keeps every event type its own
/// single-writer stream, a reasonable default absent an explicit one.
fn resolve_stream_id(event_type: &str, metadata: &Metadata) -> String {
    metadata
        .get("stream_id")
        .and_then(Value::as_str)
        .map(|s| s.to_string())
        .unwrap_or_else(|| event_type.to_string())
}

fn minute_bucket(timestamp_ms: u64) -> i64 {
    (timestamp_ms / 60_000) as i64
}

/// Commits a `ProducerPayload` if it hasn't already been committed. `Stored`
/// payloads arrived already-appended (Event Store subscription deliveries);
/// only `Raw` payloads need a fresh append.
fn ensure_persisted(store: &EventStore, payload: ProducerPayload) -> Result<Event, String> {
    match payload {
        ProducerPayload::Stored(event) => Ok(event),
        ProducerPayload::Raw(new_event) => {
            let stream_id = resolve_stream_id(&new_event.event_type, &new_event.metadata);
            store
                .append(&stream_id, ExpectedVersion::Any, vec![new_event], Metadata::new())
                .map_err(|e| e.to_string())?;
            store
                .read_stream(&stream_id, 0, usize::MAX)
                .into_iter()
                .last()
                .ok_or_else(|| "append succeeded but stream read back empty".to_string())
        }
    }
}

/// Appends every `Raw` message in the batch as one grouped append per
/// resolved stream id (the "single batched append" of §4.3 step 4), passing
/// already-`Stored` messages through untouched.
fn ensure_persisted_batch(store: &EventStore, batch: Vec<EnrichedMessage>) -> Vec<(EnrichedMessage, Result<Event, String>)> {
    let mut groups: HashMap<String, Vec<NewEvent>> = HashMap::new();
    let mut order: Vec<(usize, EnrichedMessage, Option<String>)> = Vec::with_capacity(batch.len());

    for (idx, msg) in batch.into_iter().enumerate() {
        match &msg.payload {
            ProducerPayload::Stored(_) => order.push((idx, msg, None)),
            ProducerPayload::Raw(new_event) => {
                let stream_id = resolve_stream_id(&new_event.event_type, &new_event.metadata);
                groups.entry(stream_id.clone()).or_default().push(new_event.clone());
                order.push((idx, msg, Some(stream_id)));
            }
        }
    }

    let mut committed: HashMap<String, Vec<Event>> = HashMap::new();
    for (stream_id, events) in groups {
        let count = events.len();
        let result = store.append(&stream_id, ExpectedVersion::Any, events, Metadata::new());
        if result.is_ok() {
            let tail = store.read_stream(&stream_id, 0, usize::MAX);
            let start = tail.len().saturating_sub(count);
            committed.insert(stream_id, tail[start..].to_vec());
        }
    }

    let mut cursors: HashMap<String, usize> = HashMap::new();
    order
        .into_iter()
        .map(|(_, msg, stream_id)| match (msg.payload.clone(), stream_id) {
            (ProducerPayload::Stored(event), _) => (msg, Ok(event)),
            (ProducerPayload::Raw(_), Some(stream_id)) => {
                let cursor = cursors.entry(stream_id.clone()).or_insert(0);
                let event = committed
                    .get(&stream_id)
                    .and_then(|events| events.get(*cursor))
                    .cloned()
                    .ok_or_else(|| "batched append failed for this stream".to_string());
                *cursor += 1;
                (msg, event)
            }
            (ProducerPayload::Raw(_), None) => unreachable!("raw payload always assigns a stream id"),
        })
        .collect()
}

pub async fn handle_batch(lane: Lane, batch: Vec<EnrichedMessage>, deps: &LaneDeps) {
    match lane {
        Lane::HighPriority => handle_high_priority(batch, deps).await,
        Lane::NormalPriority => handle_normal_priority(batch, deps).await,
        Lane::Analytics => handle_analytics(batch, deps).await,
        Lane::PatternMatching => handle_pattern_matching(batch, deps).await,
    }
}

async fn handle_high_priority(batch: Vec<EnrichedMessage>, deps: &LaneDeps) {
    for msg in batch {
        let msg_for_error = msg.clone();
        match ensure_persisted(&deps.store, msg.payload) {
            Ok(event) => {
                let mut payload = Value::Map(Default::default());
                if let Value::Map(ref mut m) = payload {
                    m.insert("event_type".into(), Value::String(event.event_type.clone()));
                    m.insert("stream_id".into(), Value::String(event.stream_id.clone()));
                    m.insert("correlation_id".into(), Value::String(msg_for_error.correlation_id.clone()));
                }
                let causality = Causality::root(deps.node_id.clone());
                let _ = deps.broker.publish(topics::EVENTS_HIGH_PRIORITY, payload.clone(), causality.clone()).await;
                let _ = deps.broker.publish(topics::EVENTS_LIVE, payload, causality).await;
                deps.pattern_matcher.check_critical(event).await;
            }
            Err(error) => dead_letter(&deps.store, &msg_for_error, error),
        }
    }
}

/// Elapsed wall time since the Producer stamped the message, both sides of the
/// subtraction drawn from the same monotonic clock (§4.5 latency tracking).
fn elapsed_since_received(received_at_ms: u64) -> std::time::Duration {
    std::time::Duration::from_millis(monotonic_now_ms().saturating_sub(received_at_ms))
}

async fn handle_normal_priority(batch: Vec<EnrichedMessage>, deps: &LaneDeps) {
    let results = ensure_persisted_batch(&deps.store, batch);
    let mut committed = Vec::new();
    for (msg, result) in results {
        match result {
            Ok(event) => committed.push((msg.received_at_ms, event)),
            Err(error) => dead_letter(&deps.store, &msg, error),
        }
    }
    for (received_at_ms, event) in &committed {
        deps.analytics.record_event(&event.event_type, elapsed_since_received(*received_at_ms), minute_bucket(event.timestamp.timestamp_millis() as u64));
        deps.pattern_matcher.check_standard(event.clone());
    }
    deps.pattern_matcher.flush_standard().await;
}

async fn handle_analytics(batch: Vec<EnrichedMessage>, deps: &LaneDeps) {
    let results = ensure_persisted_batch(&deps.store, batch);
    for (msg, result) in results {
        match result {
            Ok(event) => {
                let minute = minute_bucket(event.timestamp.timestamp_millis() as u64);
                deps.analytics.record_event(&event.event_type, elapsed_since_received(msg.received_at_ms), minute);
            }
            Err(error) => dead_letter(&deps.store, &msg, error),
        }
    }
}

async fn handle_pattern_matching(batch: Vec<EnrichedMessage>, deps: &LaneDeps) {
    let results = ensure_persisted_batch(&deps.store, batch);
    let mut committed = Vec::new();
    for (msg, result) in results {
        match result {
            Ok(event) => committed.push(event),
            Err(error) => dead_letter(&deps.store, &msg, error),
        }
    }
    if !committed.is_empty() {
        deps.pattern_matcher.process_events(committed).await;
    }
}
