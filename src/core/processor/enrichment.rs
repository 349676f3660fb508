// SPDX-License-Identifier: MIT OR Apache-2.0

use super::classify::Lane;
use crate::core::event::{Event, NewEvent, Value};
use crate::core::producer::message::{BufferedMessage, ProducerPayload};
use crate::core::util::{fingerprint, monotonic_now_ms};

/// A message after step 1 of the pipeline (§4.3): enriched with receive/process
/// timestamps, source, lane, correlation id and partition key, still carrying
/// whichever of raw/stored payload it arrived with.
#[derive(Debug, Clone)]
pub struct EnrichedMessage {
    pub payload: ProducerPayload,
    pub received_at_ms: u64,
    pub processing_started_at_ms: u64,
    pub correlation_id: String,
    pub partition_key: String,
    pub lane: Lane,
}

fn stream_and_type(payload: &ProducerPayload) -> (String, String, Value) {
    match payload {
        ProducerPayload::Raw(NewEvent { event_type, payload, .. }) => {
            (String::new(), event_type.clone(), payload.clone())
        }
        ProducerPayload::Stored(Event {
            stream_id,
            event_type,
            payload,
            ..
        }) => (stream_id.clone(), event_type.clone(), payload.clone()),
    }
}

/// `correlation_id` is a stable fingerprint of `stream_id + event_type` (first 12
/// hex of SHA-256); `partition_key` is derived from `stream_id` alone (§4.3.1).
pub fn enrich(message: BufferedMessage) -> EnrichedMessage {
    let (stream_id, event_type, payload) = stream_and_type(&message.payload);
    let correlation_id = fingerprint(&[stream_id.as_str(), event_type.as_str()], 12);
    let partition_key = fingerprint(&[stream_id.as_str()], 8);
    let lane = super::classify::classify(&event_type, false, &payload);
    EnrichedMessage {
        payload: message.payload,
        received_at_ms: message.received_at_ms,
        processing_started_at_ms: monotonic_now_ms(),
        correlation_id,
        partition_key,
        lane,
    }
}
