// SPDX-License-Identifier: MIT OR Apache-2.0

use super::envelope::Envelope;
use crate::core::event::{Causality, Value};
use crate::core::exception::BrokerError;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Durable publish/subscribe with a causality envelope on every message (§4.8).
/// Ack-after-process is required; an implementation redelivers anything left
/// unacked past its redelivery window.
#[async_trait]
pub trait Broker: Send + Sync {
    async fn publish(
        &self,
        topic: &str,
        payload: Value,
        causality: Causality,
    ) -> Result<Envelope, BrokerError>;

    async fn subscribe(&self, topic: &str) -> mpsc::Receiver<Envelope>;

    async fn ack(&self, message_id: &str) -> Result<(), BrokerError>;
}
