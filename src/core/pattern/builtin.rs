// SPDX-License-Identifier: MIT OR Apache-2.0

//! The canonical built-in pattern table (§4.4). Implementers reproduce this
//! exactly, including `algedonic_cascade`'s two-wildcard glob.

use super::spec::{PatternSpec, Severity};
use crate::core::event::Event;
use std::sync::Arc;

fn count(events: &[Event], event_type: &str) -> usize {
    events.iter().filter(|e| e.event_type == event_type).count()
}

fn count_prefix(events: &[Event], prefix: &str) -> usize {
    events.iter().filter(|e| e.event_type.starts_with(prefix)).count()
}

pub fn builtin_specs() -> Vec<PatternSpec> {
    vec![
        PatternSpec::new_builtin(
            "variety_imbalance",
            vec!["variety.amplified", "variety.filtered"],
            Arc::new(|events| {
                let amplified = count(events, "variety.amplified") as f64;
                let filtered = count(events, "variety.filtered") as f64;
                let ratio = if filtered == 0.0 { amplified } else { amplified / filtered };
                ratio > 3.0
            }),
            Severity::Warning,
            "rebalance_variety",
        ),
        PatternSpec::new_builtin(
            "algedonic_cascade",
            vec!["algedonic.pain.detected", "system*.*.degraded"],
            Arc::new(|events| {
                let pain = count(events, "algedonic.pain.detected");
                let degraded = events
                    .iter()
                    .filter(|e| {
                        crate::core::util::glob::matches_multi_wildcard(
                            "system*.*.degraded",
                            &e.event_type,
                        )
                    })
                    .count();
                pain >= 1 && degraded >= 2
            }),
            Severity::Critical,
            "trigger_autonomic_response",
        ),
        PatternSpec::new_builtin(
            "recursive_explosion",
            vec!["recursion.meta_vsm.spawned"],
            Arc::new(|events| count(events, "recursion.meta_vsm.spawned") > 5),
            Severity::Critical,
            "limit_recursion",
        ),
        PatternSpec::new_builtin(
            "coordination_failure",
            vec!["system2.coordination.failed", "system1.operation.timeout"],
            Arc::new(|events| {
                count(events, "system2.coordination.failed") >= 3
                    || count(events, "system1.operation.timeout") >= 5
            }),
            Severity::Warning,
            "restart_coordination",
        ),
        PatternSpec::new_builtin(
            "intelligence_overload",
            vec!["system4.intelligence.analyzed", "system4.analysis.timeout"],
            Arc::new(|events| {
                let analyzed = count(events, "system4.intelligence.analyzed") as f64;
                let timeouts = count(events, "system4.analysis.timeout") as f64;
                analyzed > 0.0 && timeouts / analyzed > 0.3
            }),
            Severity::Warning,
            "scale_intelligence",
        ),
        PatternSpec::new_builtin(
            "emergent_behavior",
            vec!["emergent.*", "system*.unexpected.*"],
            Arc::new(|events| {
                let emergent = count_prefix(events, "emergent.");
                let unexpected = events
                    .iter()
                    .filter(|e| {
                        crate::core::util::glob::matches_multi_wildcard(
                            "system*.unexpected.*",
                            &e.event_type,
                        )
                    })
                    .count();
                emergent + unexpected >= 3
            }),
            Severity::Info,
            "analyze_emergence",
        ),
        PatternSpec::new_builtin(
            "policy_violation_cascade",
            vec!["system5.policy.violated", "system3.control.override"],
            Arc::new(|events| {
                count(events, "system5.policy.violated") >= 2
                    && count(events, "system3.control.override") >= 1
            }),
            Severity::Critical,
            "enforce_policies",
        ),
    ]
}
