// SPDX-License-Identifier: MIT OR Apache-2.0

use super::enrichment::EnrichedMessage;
use crate::core::event::Value;
use crate::core::event::{Metadata, NewEvent};
use crate::core::producer::message::ProducerPayload;
use crate::core::store::{EventStore, ExpectedVersion};
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;

pub const DEAD_LETTER_STREAM: &str = "__dead_letter";

/// Renders whichever event the failed message was carrying — already-committed
/// (`Event`, full identity and position) or still-raw (`NewEvent`, no identity
/// yet assigned) — as the `original` field of a dead-letter record, so a
/// dead-lettered message's data is recoverable by reading the stream back.
fn original_value(payload: &ProducerPayload) -> Value {
    let mut fields = BTreeMap::new();
    match payload {
        ProducerPayload::Stored(event) => {
            fields.insert("id".to_string(), Value::String(event.id.to_string()));
            fields.insert("stream_id".to_string(), Value::String(event.stream_id.clone()));
            fields.insert("stream_version".to_string(), Value::Int(event.stream_version as i64));
            fields.insert("global_position".to_string(), Value::Int(event.global_position as i64));
            fields.insert("event_type".to_string(), Value::String(event.event_type.clone()));
            fields.insert("payload".to_string(), event.payload.clone());
            fields.insert("metadata".to_string(), Value::Map(event.metadata.clone()));
        }
        ProducerPayload::Raw(new_event) => {
            fields.insert("event_type".to_string(), Value::String(new_event.event_type.clone()));
            fields.insert("payload".to_string(), new_event.payload.clone());
            fields.insert("metadata".to_string(), Value::Map(new_event.metadata.clone()));
        }
    }
    Value::Map(fields)
}

/// Records a failed batch step as a dead-letter event and never lets the failure
/// propagate past the lane that produced it (§4.3 failure semantics, §7).
pub fn dead_letter(store: &Arc<EventStore>, message: &EnrichedMessage, error: impl Into<String>) {
    let error = error.into();
    tracing::error!(correlation_id = %message.correlation_id, %error, "processing_error");

    let mut fields = BTreeMap::new();
    fields.insert("original".to_string(), original_value(&message.payload));
    fields.insert("error".to_string(), Value::String(error));
    fields.insert("timestamp".to_string(), Value::String(Utc::now().to_rfc3339()));
    fields.insert("retry_count".to_string(), Value::Int(0));

    let record = NewEvent::new("dead_letter.recorded", Value::Map(fields))
        .with_correlation_id(message.correlation_id.clone());
    let _ = store.append(
        DEAD_LETTER_STREAM,
        ExpectedVersion::Any,
        vec![record],
        Metadata::new(),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::event::NewEvent as RawNewEvent;
    use crate::core::persistence::InMemoryBackend;
    use crate::core::processor::classify::Lane;

    #[test]
    fn dead_letter_record_carries_the_original_event_payload() {
        let store = Arc::new(EventStore::new(Arc::new(InMemoryBackend::new())));
        let message = EnrichedMessage {
            payload: ProducerPayload::Raw(RawNewEvent::new("orders.created", Value::Int(7))),
            received_at_ms: 0,
            processing_started_at_ms: 0,
            correlation_id: "corr-1".to_string(),
            partition_key: "part-1".to_string(),
            lane: Lane::NormalPriority,
        };

        dead_letter(&store, &message, "store append failed");

        let events = store.read_stream(DEAD_LETTER_STREAM, 0, 10);
        assert_eq!(events.len(), 1);
        let original = events[0].payload.get("original").expect("original field present");
        assert_eq!(original.get("event_type").and_then(Value::as_str), Some("orders.created"));
        assert_eq!(original.get("payload").and_then(Value::as_i64), Some(7));
        assert_eq!(events[0].payload.get("retry_count").and_then(Value::as_i64), Some(0));
    }
}
