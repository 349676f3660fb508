// SPDX-License-Identifier: MIT OR Apache-2.0

use super::broker_trait::Broker;
use super::topics::{EMERGENCY_RECURSION, EMERGENCY_RESPONSE};
use crate::core::event::{Causality, Value};
use async_trait::async_trait;
use std::sync::Arc;

/// Action-tag dispatch contract (§4.4.1): the Pattern Matcher hands off a matched
/// action tag without knowing what happens next.
#[async_trait]
pub trait ActionDispatcher: Send + Sync {
    async fn dispatch(&self, action_tag: &str, payload: Value, causality: Causality);
}

/// Republishes every action tag to its pattern-match topic, and additionally to
/// an emergency topic variant when the tag names a critical response.
pub struct BroadcastDispatcher {
    broker: Arc<dyn Broker>,
    node_id: String,
}

impl BroadcastDispatcher {
    pub fn new(broker: Arc<dyn Broker>, node_id: impl Into<String>) -> Self {
        Self {
            broker,
            node_id: node_id.into(),
        }
    }

    fn emergency_topic(action_tag: &str) -> Option<&'static str> {
        match action_tag {
            "trigger_autonomic_response" | "enforce_policies" => Some(EMERGENCY_RESPONSE),
            "limit_recursion" => Some(EMERGENCY_RECURSION),
            _ => None,
        }
    }
}

#[async_trait]
impl ActionDispatcher for BroadcastDispatcher {
    async fn dispatch(&self, action_tag: &str, payload: Value, causality: Causality) {
        let topic = format!("pattern:action:{action_tag}");
        let _ = self.broker.publish(&topic, payload.clone(), causality.clone()).await;
        if let Some(emergency) = Self::emergency_topic(action_tag) {
            let hop = causality.next_hop(self.node_id.clone());
            let _ = self.broker.publish(emergency, payload, hop).await;
        }
    }
}
