// SPDX-License-Identifier: MIT OR Apache-2.0

use super::message::BufferedMessage;
use crate::core::util::pipeline::DropOldestCounter;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Bounded FIFO with drop-oldest-on-overflow (§4.2). All ingest paths route
/// through `push`, so integrity doesn't depend on which source called it.
pub struct DropOldestBuffer {
    capacity: usize,
    queue: Mutex<VecDeque<BufferedMessage>>,
    total_produced: AtomicU64,
    overflow: DropOldestCounter,
}

impl DropOldestBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            queue: Mutex::new(VecDeque::with_capacity(capacity)),
            total_produced: AtomicU64::new(0),
            overflow: DropOldestCounter::new(),
        }
    }

    /// Pushes `message`; if the buffer is at capacity, the oldest entry is
    /// dropped to make room. Returns `true` if a drop occurred.
    pub fn push(&self, message: BufferedMessage) -> bool {
        let mut queue = self.queue.lock().unwrap();
        let dropped = if queue.len() >= self.capacity {
            queue.pop_front();
            self.overflow.record_drop();
            true
        } else {
            false
        };
        queue.push_back(message);
        self.total_produced.fetch_add(1, Ordering::Relaxed);
        dropped
    }

    /// Demand-pull: returns up to `n` buffered messages, oldest first.
    pub fn pull(&self, n: usize) -> Vec<BufferedMessage> {
        let mut queue = self.queue.lock().unwrap();
        let take = n.min(queue.len());
        queue.drain(..take).collect()
    }

    pub fn fill_level(&self) -> usize {
        self.queue.lock().unwrap().len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn total_produced(&self) -> u64 {
        self.total_produced.load(Ordering::Relaxed)
    }

    pub fn total_dropped(&self) -> u64 {
        self.overflow.total_dropped()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::event::Value;
    use crate::core::producer::message::{ProducerPayload, SourceKind};
    use crate::core::event::NewEvent;

    fn msg() -> BufferedMessage {
        BufferedMessage {
            payload: ProducerPayload::Raw(NewEvent::new("t", Value::Null)),
            source: SourceKind::Injected,
            received_at_ms: 0,
        }
    }

    #[test]
    fn overflow_drops_oldest_and_counts_it() {
        let buf = DropOldestBuffer::new(2);
        buf.push(msg());
        buf.push(msg());
        let dropped = buf.push(msg());
        assert!(dropped);
        assert_eq!(buf.fill_level(), 2);
        assert_eq!(buf.total_dropped(), 1);
        assert_eq!(buf.total_produced(), 3);
    }

    #[test]
    fn pull_returns_min_of_requested_and_buffered() {
        let buf = DropOldestBuffer::new(10);
        buf.push(msg());
        buf.push(msg());
        let pulled = buf.pull(5);
        assert_eq!(pulled.len(), 2);
        assert_eq!(buf.fill_level(), 0);
    }
}
