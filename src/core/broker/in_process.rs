// SPDX-License-Identifier: MIT OR Apache-2.0

use super::broker_trait::Broker;
use super::envelope::Envelope;
use crate::core::event::{Causality, Value};
use crate::core::exception::BrokerError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

const REDELIVERY_AFTER: Duration = Duration::from_secs(5);

struct Unacked {
    envelope: Envelope,
    sent_at: Instant,
}

/// Default `Broker`: topic fan-out over bounded `tokio::mpsc` channels, held in
/// process. Unacked messages are retried by a background sweep rather than a
/// real broker's persistent queue — sufficient for a single-node deployment.
pub struct InProcessBroker {
    node_id: String,
    channel_capacity: usize,
    subscribers: Mutex<HashMap<String, Vec<mpsc::Sender<Envelope>>>>,
    unacked: Mutex<HashMap<String, Unacked>>,
}

impl InProcessBroker {
    pub fn new(node_id: impl Into<String>, channel_capacity: usize) -> Self {
        Self {
            node_id: node_id.into(),
            channel_capacity,
            subscribers: Mutex::new(HashMap::new()),
            unacked: Mutex::new(HashMap::new()),
        }
    }

    fn fan_out(&self, topic: &str, envelope: &Envelope) {
        let mut subs = self.subscribers.lock().unwrap();
        if let Some(senders) = subs.get_mut(topic) {
            senders.retain(|tx| tx.try_send(envelope.clone()).is_ok());
        }
    }

    /// Resends every envelope that has been waiting longer than `REDELIVERY_AFTER`.
    pub fn sweep_redeliveries(&self) {
        let now = Instant::now();
        let stale: Vec<Envelope> = {
            let unacked = self.unacked.lock().unwrap();
            unacked
                .values()
                .filter(|u| now.duration_since(u.sent_at) >= REDELIVERY_AFTER)
                .map(|u| u.envelope.clone())
                .collect()
        };
        for envelope in stale {
            tracing::warn!(message_id = %envelope.message_id, topic = %envelope.topic, "redelivering unacked message");
            self.fan_out(&envelope.topic, &envelope);
            let mut unacked = self.unacked.lock().unwrap();
            if let Some(entry) = unacked.get_mut(&envelope.message_id) {
                entry.sent_at = now;
            }
        }
    }

    pub fn pending_unacked(&self) -> usize {
        self.unacked.lock().unwrap().len()
    }
}

#[async_trait]
impl Broker for InProcessBroker {
    async fn publish(
        &self,
        topic: &str,
        payload: Value,
        causality: Causality,
    ) -> Result<Envelope, BrokerError> {
        let next_hop = causality.next_hop(self.node_id.clone());
        let envelope = Envelope::new(topic, payload, next_hop);
        self.fan_out(topic, &envelope);
        self.unacked.lock().unwrap().insert(
            envelope.message_id.clone(),
            Unacked {
                envelope: envelope.clone(),
                sent_at: Instant::now(),
            },
        );
        Ok(envelope)
    }

    async fn subscribe(&self, topic: &str) -> mpsc::Receiver<Envelope> {
        let (tx, rx) = mpsc::channel(self.channel_capacity);
        self.subscribers
            .lock()
            .unwrap()
            .entry(topic.to_string())
            .or_default()
            .push(tx);
        rx
    }

    async fn ack(&self, message_id: &str) -> Result<(), BrokerError> {
        self.unacked
            .lock()
            .unwrap()
            .remove(message_id)
            .map(|_| ())
            .ok_or_else(|| BrokerError::UnknownMessage(message_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::broker::topics::EVENTS_ALL;

    #[tokio::test]
    async fn subscriber_receives_published_message() {
        let broker = InProcessBroker::new("node-a", 16);
        let mut rx = broker.subscribe(EVENTS_ALL).await;
        broker
            .publish(EVENTS_ALL, Value::Null, Causality::root("node-a"))
            .await
            .unwrap();
        let received = rx.recv().await.unwrap();
        assert_eq!(received.topic, EVENTS_ALL);
    }

    #[tokio::test]
    async fn ack_removes_from_unacked_set() {
        let broker = InProcessBroker::new("node-a", 16);
        let envelope = broker
            .publish(EVENTS_ALL, Value::Null, Causality::root("node-a"))
            .await
            .unwrap();
        assert_eq!(broker.pending_unacked(), 1);
        broker.ack(&envelope.message_id).await.unwrap();
        assert_eq!(broker.pending_unacked(), 0);
    }

    #[tokio::test]
    async fn ack_unknown_message_errors() {
        let broker = InProcessBroker::new("node-a", 16);
        assert!(broker.ack("does-not-exist").await.is_err());
    }

    #[tokio::test]
    async fn causality_chain_depth_increments_on_publish() {
        let broker = InProcessBroker::new("node-a", 16);
        let root = Causality::root("node-a");
        let envelope = broker.publish(EVENTS_ALL, Value::Null, root.clone()).await.unwrap();
        assert_eq!(envelope.causality.chain_depth, 1);
        assert_eq!(envelope.causality.trace_id, root.trace_id);
    }
}
