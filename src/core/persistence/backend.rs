// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::core::event::Event;
use crate::core::exception::StoreError;
use std::collections::HashMap;
use std::sync::Mutex;

/// What the Event Store writes committed batches through. Stream/version semantics
/// (optimistic concurrency, gap-free ordering) live in the store; a backend only
/// has to durably keep what it's handed and give it back in order.
pub trait PersistenceBackend: Send + Sync {
    fn persist_batch(&self, stream_id: &str, events: &[Event]) -> Result<(), StoreError>;
    fn load_stream(&self, stream_id: &str) -> Result<Vec<Event>, StoreError>;
}

/// Discards everything. Useful when only in-process delivery matters (tests, or a
/// deployment that treats the store as a cache over an external system of record).
#[derive(Debug, Default)]
pub struct NullBackend;

impl PersistenceBackend for NullBackend {
    fn persist_batch(&self, _stream_id: &str, _events: &[Event]) -> Result<(), StoreError> {
        Ok(())
    }

    fn load_stream(&self, _stream_id: &str) -> Result<Vec<Event>, StoreError> {
        Ok(Vec::new())
    }
}

/// Keeps every event in memory, append-only per stream. The store's source of
/// truth for an in-process deployment; swap for a real log implementation without
/// touching call sites.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    streams: Mutex<HashMap<String, Vec<Event>>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PersistenceBackend for InMemoryBackend {
    fn persist_batch(&self, stream_id: &str, events: &[Event]) -> Result<(), StoreError> {
        let mut streams = self.streams.lock().unwrap();
        streams
            .entry(stream_id.to_string())
            .or_default()
            .extend(events.iter().cloned());
        Ok(())
    }

    fn load_stream(&self, stream_id: &str) -> Result<Vec<Event>, StoreError> {
        let streams = self.streams.lock().unwrap();
        Ok(streams.get(stream_id).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::event::Value;
    use chrono::Utc;
    use uuid::Uuid;

    fn sample_event(stream_id: &str, version: u64) -> Event {
        Event {
            id: Uuid::new_v4(),
            stream_id: stream_id.to_string(),
            stream_version: version,
            global_position: version,
            event_type: "test.event".to_string(),
            payload: Value::Null,
            metadata: Default::default(),
            correlation_id: None,
            causation_id: None,
            timestamp: Utc::now(),
            causality: None,
        }
    }

    #[test]
    fn in_memory_backend_round_trips_in_order() {
        let backend = InMemoryBackend::new();
        backend
            .persist_batch("orders-1", &[sample_event("orders-1", 1), sample_event("orders-1", 2)])
            .unwrap();
        backend.persist_batch("orders-1", &[sample_event("orders-1", 3)]).unwrap();

        let loaded = backend.load_stream("orders-1").unwrap();
        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded[2].stream_version, 3);
    }

    #[test]
    fn null_backend_is_always_empty() {
        let backend = NullBackend;
        backend.persist_batch("s", &[sample_event("s", 1)]).unwrap();
        assert!(backend.load_stream("s").unwrap().is_empty());
    }
}
