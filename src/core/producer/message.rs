// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::core::event::{Event, NewEvent};

/// Where a message entered the Producer's buffer from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    StoreSubscription,
    Injected,
    Broadcast,
    ExternalPoll,
}

/// Either a raw event still awaiting a store append, or an already-committed
/// event arriving for downstream fan-out (store subscription, broadcast replay).
#[derive(Debug, Clone)]
pub enum ProducerPayload {
    Raw(NewEvent),
    Stored(Event),
}

/// One buffered message, stamped with a receive timestamp the moment it enters
/// the Producer (distinct from `processing_started_at`, which the Processor sets).
#[derive(Debug, Clone)]
pub struct BufferedMessage {
    pub payload: ProducerPayload,
    pub source: SourceKind,
    pub received_at_ms: u64,
}
