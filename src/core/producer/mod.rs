// SPDX-License-Identifier: MIT OR Apache-2.0

//! Producer (C2): ingests from every upstream source into one bounded,
//! drop-oldest buffer and serves the Processor's demand-pull reads.

pub mod buffer;
pub mod external_source;
pub mod message;

use buffer::DropOldestBuffer;
use crossbeam_channel::Receiver;
use external_source::ExternalSource;
use message::{BufferedMessage, ProducerPayload, SourceKind};
use std::sync::Arc;
use std::time::Duration;

use crate::core::event::{Event, NewEvent};
use crate::core::util::metrics::{Counter, ThroughputTracker};
use crate::core::util::monotonic_now_ms;

pub const DEFAULT_BUFFER_CAPACITY: usize = 1000;
pub const EXTERNAL_POLL_INTERVAL_MS: u64 = 100;

pub struct Producer {
    buffer: Arc<DropOldestBuffer>,
    rate_tracker: Arc<ThroughputTracker>,
    dropped_counter: Arc<Counter>,
}

impl Producer {
    pub fn new(buffer_capacity: usize) -> Self {
        Self {
            buffer: Arc::new(DropOldestBuffer::new(buffer_capacity)),
            rate_tracker: ThroughputTracker::named("producer.rate_per_sec"),
            dropped_counter: Counter::named("producer.buffer_overflow_dropped"),
        }
    }

    fn stamp(&self) -> u64 {
        monotonic_now_ms()
    }

    fn push(&self, payload: ProducerPayload, source: SourceKind) {
        let dropped = self.buffer.push(BufferedMessage {
            payload,
            source,
            received_at_ms: self.stamp(),
        });
        self.rate_tracker.record(1);
        if dropped {
            self.dropped_counter.inc();
            tracing::warn!(
                total_dropped = self.buffer.total_dropped(),
                "buffer_overflow_dropped"
            );
        }
    }

    pub fn inject(&self, event: NewEvent) {
        self.push(ProducerPayload::Raw(event), SourceKind::Injected);
    }

    pub fn ingest_from_subscription(&self, event: Event) {
        self.push(ProducerPayload::Stored(event), SourceKind::StoreSubscription);
    }

    pub fn ingest_broadcast(&self, event: Event) {
        self.push(ProducerPayload::Stored(event), SourceKind::Broadcast);
    }

    /// Demand-pull interface: returns `min(n, buffered)` messages, oldest first.
    pub fn pull(&self, n: usize) -> Vec<BufferedMessage> {
        self.buffer.pull(n)
    }

    pub fn buffer_fill_level(&self) -> usize {
        self.buffer.fill_level()
    }

    pub fn buffer_capacity(&self) -> usize {
        self.buffer.capacity()
    }

    pub fn total_produced(&self) -> u64 {
        self.buffer.total_produced()
    }

    pub fn total_dropped(&self) -> u64 {
        self.buffer.total_dropped()
    }

    /// Drains every event the store delivered since the last call into the buffer.
    /// Intended to be driven by a task reading a `crossbeam_channel::Receiver<Event>`
    /// returned from `EventStore::subscribe_all`/`subscribe_stream`.
    pub fn drain_subscription(&self, rx: &Receiver<Event>) {
        while let Ok(event) = rx.try_recv() {
            self.ingest_from_subscription(event);
        }
    }

    /// Spawns the periodic external poll task (every 100 ms, 0..3 events per tick).
    pub fn spawn_external_poll(
        self: &Arc<Self>,
        source: Arc<dyn ExternalSource>,
        interval: Duration,
    ) -> tokio::task::JoinHandle<()> {
        let producer = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                for event in source.poll() {
                    producer.push(ProducerPayload::Raw(event), SourceKind::ExternalPoll);
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::event::Value;
    use std::time::Duration;

    #[test]
    fn inject_then_pull_round_trips() {
        let producer = Producer::new(10);
        producer.inject(NewEvent::new("t", Value::Null));
        let pulled = producer.pull(5);
        assert_eq!(pulled.len(), 1);
        assert_eq!(producer.buffer_fill_level(), 0);
    }

    #[test]
    fn overflow_is_observable_via_counters() {
        let producer = Producer::new(1);
        producer.inject(NewEvent::new("a", Value::Null));
        producer.inject(NewEvent::new("b", Value::Null));
        assert_eq!(producer.total_dropped(), 1);
        assert_eq!(producer.total_produced(), 2);
        assert_eq!(producer.buffer_fill_level(), 1);
    }

    #[tokio::test]
    async fn external_poll_feeds_buffer_on_tick() {
        use external_source::ScriptedSource;
        let producer = Arc::new(Producer::new(10));
        let source: Arc<dyn ExternalSource> = Arc::new(ScriptedSource::new(vec![vec![
            NewEvent::new("external.one", Value::Null),
            NewEvent::new("external.two", Value::Null),
        ]]));
        let handle = producer.spawn_external_poll(source, Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.abort();
        assert!(producer.buffer_fill_level() >= 2);
    }
}
