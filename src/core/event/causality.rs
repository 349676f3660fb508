// SPDX-License-Identifier: MIT OR Apache-2.0

//! Causality envelope propagated on every broker message (§4.8).
//!
//! `trace_id` survives an entire request chain; `span_id`/`parent_span_id` form a
//! tree within it; `chain_depth` is incremented on every hop and exists purely as
//! a cheap loop guard, not a substitute for real distributed tracing.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Causality {
    pub trace_id: String,
    pub span_id: String,
    pub parent_span_id: Option<String>,
    pub chain_depth: u32,
    pub origin_node: String,
}

impl Causality {
    /// Start a new causality chain at hop zero.
    pub fn root(origin_node: impl Into<String>) -> Self {
        Self {
            trace_id: Uuid::new_v4().to_string(),
            span_id: Uuid::new_v4().to_string(),
            parent_span_id: None,
            chain_depth: 0,
            origin_node: origin_node.into(),
        }
    }

    /// Derive the envelope for the next hop: same trace, new span, depth + 1.
    pub fn next_hop(&self, origin_node: impl Into<String>) -> Self {
        Self {
            trace_id: self.trace_id.clone(),
            span_id: Uuid::new_v4().to_string(),
            parent_span_id: Some(self.span_id.clone()),
            chain_depth: self.chain_depth + 1,
            origin_node: origin_node.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_hop_preserves_trace_and_bumps_depth() {
        let root = Causality::root("node-a");
        let hop1 = root.next_hop("node-b");
        assert_eq!(hop1.trace_id, root.trace_id);
        assert_eq!(hop1.parent_span_id.as_deref(), Some(root.span_id.as_str()));
        assert_eq!(hop1.chain_depth, 1);
        assert_ne!(hop1.span_id, root.span_id);
    }
}
