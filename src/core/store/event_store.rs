// SPDX-License-Identifier: MIT OR Apache-2.0

use super::model::{AppendOutcome, ExpectedVersion, Snapshot, StreamMeta};
use super::subscriber::Subscriber;
use crate::core::event::{Event, Metadata, NewEvent};
use crate::core::exception::StoreError;
use crate::core::persistence::PersistenceBackend;
use crate::core::util::{monotonic_now_ms, wall_clock_now};
use crossbeam_channel::{bounded, Receiver};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

const SNAPSHOT_INTERVAL: u64 = 100;
const SUBSCRIBER_INBOX_CAPACITY: usize = 1024;

#[derive(Default)]
struct StreamState {
    events: Vec<Event>,
    meta: StreamMeta,
    snapshot: Option<Snapshot>,
}

/// Append-only per-stream event log (C1). Owns events and snapshots exclusively;
/// every other component only ever sees copies handed back from its operations.
pub struct EventStore {
    backend: Arc<dyn PersistenceBackend>,
    streams: Mutex<HashMap<String, StreamState>>,
    global_position: AtomicU64,
    all_events: Mutex<Vec<Event>>,
    subscribers_all: Mutex<Vec<Arc<Subscriber>>>,
    subscribers_stream: Mutex<HashMap<String, Vec<Arc<Subscriber>>>>,
}

impl EventStore {
    pub fn new(backend: Arc<dyn PersistenceBackend>) -> Self {
        Self {
            backend,
            streams: Mutex::new(HashMap::new()),
            global_position: AtomicU64::new(0),
            all_events: Mutex::new(Vec::new()),
            subscribers_all: Mutex::new(Vec::new()),
            subscribers_stream: Mutex::new(HashMap::new()),
        }
    }

    /// Check-then-apply append, atomic per stream (P1, P2, P3).
    pub fn append(
        &self,
        stream_id: &str,
        expected_version: ExpectedVersion,
        new_events: Vec<NewEvent>,
        extra_metadata: Metadata,
    ) -> Result<AppendOutcome, StoreError> {
        let mut streams = self.streams.lock().unwrap();
        let state = streams.entry(stream_id.to_string()).or_default();

        if let ExpectedVersion::Exact(expected) = expected_version {
            if expected != state.meta.current_version {
                return Ok(AppendOutcome::Conflict {
                    current_version: state.meta.current_version,
                });
            }
        }

        let mut appended = Vec::with_capacity(new_events.len());
        for new_event in new_events {
            let stream_version = state.meta.current_version + 1;
            let global_position = self.global_position.fetch_add(1, Ordering::SeqCst) + 1;
            let mut metadata = extra_metadata.clone();
            metadata.extend(new_event.metadata);
            let event = Event {
                id: uuid::Uuid::new_v4(),
                stream_id: stream_id.to_string(),
                stream_version,
                global_position,
                event_type: new_event.event_type,
                payload: new_event.payload,
                metadata,
                correlation_id: new_event.correlation_id,
                causation_id: new_event.causation_id,
                timestamp: wall_clock_now(),
                causality: None,
            };
            state.meta.current_version = stream_version;
            if state.meta.first_timestamp.is_none() {
                state.meta.first_timestamp = Some(event.timestamp);
            }
            state.meta.last_timestamp = Some(event.timestamp);
            state.events.push(event.clone());
            appended.push(event);
        }

        self.backend.persist_batch(stream_id, &appended)?;
        self.all_events.lock().unwrap().extend(appended.iter().cloned());

        let new_version = state.meta.current_version;
        if new_version - state.meta.snapshot_version.unwrap_or(0) >= SNAPSHOT_INTERVAL {
            if let Some(last) = appended.last() {
                state.snapshot = Some(Snapshot {
                    stream_id: stream_id.to_string(),
                    aggregate_version: new_version,
                    payload: last.payload.clone(),
                    timestamp: last.timestamp,
                });
                state.meta.snapshot_version = Some(new_version);
            }
        }
        drop(streams);

        for event in &appended {
            self.deliver(event);
        }

        Ok(AppendOutcome::Ok { new_version })
    }

    pub fn read_stream(&self, stream_id: &str, from_version: u64, max_count: usize) -> Vec<Event> {
        let streams = self.streams.lock().unwrap();
        match streams.get(stream_id) {
            None => Vec::new(),
            Some(state) => state
                .events
                .iter()
                .filter(|e| e.stream_version > from_version)
                .take(max_count)
                .cloned()
                .collect(),
        }
    }

    pub fn read_all(&self, from_position: u64, max_count: usize) -> Vec<Event> {
        let all = self.all_events.lock().unwrap();
        all.iter()
            .filter(|e| e.global_position > from_position)
            .take(max_count)
            .cloned()
            .collect()
    }

    pub fn save_snapshot(&self, snapshot: Snapshot) {
        let mut streams = self.streams.lock().unwrap();
        let state = streams.entry(snapshot.stream_id.clone()).or_default();
        state.meta.snapshot_version = Some(snapshot.aggregate_version);
        state.snapshot = Some(snapshot);
    }

    pub fn load_snapshot(&self, stream_id: &str) -> Option<Snapshot> {
        let streams = self.streams.lock().unwrap();
        streams.get(stream_id).and_then(|s| s.snapshot.clone())
    }

    pub fn stream_meta(&self, stream_id: &str) -> StreamMeta {
        let streams = self.streams.lock().unwrap();
        streams.get(stream_id).map(|s| s.meta.clone()).unwrap_or_default()
    }

    pub fn subscribe_all(&self) -> Receiver<Event> {
        let (tx, rx) = bounded(SUBSCRIBER_INBOX_CAPACITY);
        self.subscribers_all.lock().unwrap().push(Arc::new(Subscriber::new(tx)));
        rx
    }

    pub fn subscribe_stream(&self, stream_id: &str) -> Receiver<Event> {
        let (tx, rx) = bounded(SUBSCRIBER_INBOX_CAPACITY);
        self.subscribers_stream
            .lock()
            .unwrap()
            .entry(stream_id.to_string())
            .or_default()
            .push(Arc::new(Subscriber::new(tx)));
        rx
    }

    fn deliver(&self, event: &Event) {
        let _ = monotonic_now_ms();
        let mut all_subs = self.subscribers_all.lock().unwrap();
        for sub in all_subs.iter() {
            sub.try_deliver(event.clone());
        }
        all_subs.retain(|s| s.is_alive());
        drop(all_subs);

        let mut stream_subs = self.subscribers_stream.lock().unwrap();
        if let Some(subs) = stream_subs.get_mut(&event.stream_id) {
            for sub in subs.iter() {
                sub.try_deliver(event.clone());
            }
            subs.retain(|s| s.is_alive());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::event::Value;
    use crate::core::persistence::InMemoryBackend;

    fn store() -> EventStore {
        EventStore::new(Arc::new(InMemoryBackend::new()))
    }

    fn two_events() -> Vec<NewEvent> {
        vec![
            NewEvent::new("system1.operation.completed", Value::Null),
            NewEvent::new("system1.operation.completed", Value::Null),
        ]
    }

    #[test]
    fn concurrent_expected_version_conflict_scenario() {
        let s = store();
        // prime the stream to version 5
        for _ in 0..5 {
            s.append(
                "orders-1",
                ExpectedVersion::Any,
                vec![NewEvent::new("seed", Value::Null)],
                Metadata::new(),
            )
            .unwrap();
        }
        let first = s
            .append("orders-1", ExpectedVersion::Exact(5), two_events(), Metadata::new())
            .unwrap();
        let second = s
            .append("orders-1", ExpectedVersion::Exact(5), two_events(), Metadata::new())
            .unwrap();

        let oks = [first, second]
            .iter()
            .filter(|o| matches!(o, AppendOutcome::Ok { new_version: 7 }))
            .count();
        let conflicts = [first, second]
            .iter()
            .filter(|o| matches!(o, AppendOutcome::Conflict { current_version: 7 }))
            .count();
        assert_eq!(oks, 1);
        assert_eq!(conflicts, 1);

        let all = s.read_stream("orders-1", 0, 100);
        assert_eq!(all.len(), 7);
        for (i, e) in all.iter().enumerate() {
            assert_eq!(e.stream_version, (i + 1) as u64);
        }
    }

    #[test]
    fn unknown_stream_reads_as_empty() {
        let s = store();
        assert!(s.read_stream("nonexistent", 0, 10).is_empty());
    }

    #[test]
    fn global_position_strictly_increases_across_streams() {
        let s = store();
        s.append("a", ExpectedVersion::Any, vec![NewEvent::new("t", Value::Null)], Metadata::new())
            .unwrap();
        s.append("b", ExpectedVersion::Any, vec![NewEvent::new("t", Value::Null)], Metadata::new())
            .unwrap();
        let all = s.read_all(0, 10);
        assert_eq!(all.len(), 2);
        assert!(all[0].global_position < all[1].global_position);
    }

    #[test]
    fn subscriber_receives_appended_events_in_order() {
        let s = store();
        let rx = s.subscribe_stream("orders-1");
        s.append("orders-1", ExpectedVersion::Any, two_events(), Metadata::new()).unwrap();
        let e1 = rx.try_recv().unwrap();
        let e2 = rx.try_recv().unwrap();
        assert_eq!(e1.stream_version, 1);
        assert_eq!(e2.stream_version, 2);
    }

    #[test]
    fn auto_snapshot_emitted_every_hundred_versions() {
        let s = store();
        for _ in 0..100 {
            s.append("s", ExpectedVersion::Any, vec![NewEvent::new("t", Value::Null)], Metadata::new())
                .unwrap();
        }
        let snap = s.load_snapshot("s").unwrap();
        assert_eq!(snap.aggregate_version, 100);
    }
}
