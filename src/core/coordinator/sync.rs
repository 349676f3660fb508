// SPDX-License-Identifier: MIT OR Apache-2.0

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    Completed,
    Partial,
    Failed,
}

#[derive(Debug, Clone)]
pub struct ContextAck {
    pub context_id: String,
    pub state_fingerprint: String,
    pub last_update_ms: u64,
}

#[derive(Debug, Clone)]
pub struct SyncResult {
    pub id: String,
    pub contexts: Vec<String>,
    pub status: SyncStatus,
    pub per_context: Vec<(String, bool)>,
    pub effectiveness: f64,
}

/// Base effectiveness by outcome status (§4.7 step 5).
fn base_effectiveness(status: SyncStatus) -> f64 {
    match status {
        SyncStatus::Completed => 1.0,
        SyncStatus::Partial => 0.5,
        SyncStatus::Failed => 0.0,
    }
}

/// Effectiveness decays as elapsed time approaches the ack timeout.
fn time_factor(elapsed: Duration, timeout: Duration) -> f64 {
    if timeout.is_zero() {
        return 1.0;
    }
    (1.0 - elapsed.as_secs_f64() / timeout.as_secs_f64()).clamp(0.0, 1.0)
}

/// Computes the "aligned state": latest fingerprint by last-update timestamp
/// (§4.7 step 3). Returns `None` if no acks arrived.
pub fn aligned_state(acks: &[ContextAck]) -> Option<&ContextAck> {
    acks.iter().max_by_key(|a| a.last_update_ms)
}

pub fn build_sync_result(
    id: String,
    all_contexts: &[String],
    acks: &[ContextAck],
    elapsed: Duration,
    timeout: Duration,
    action_success_rate: f64,
) -> SyncResult {
    let responded: Vec<&str> = acks.iter().map(|a| a.context_id.as_str()).collect();
    let missing: Vec<&String> = all_contexts.iter().filter(|c| !responded.contains(&c.as_str())).collect();

    let status = if missing.is_empty() {
        SyncStatus::Completed
    } else if missing.len() == all_contexts.len() {
        SyncStatus::Failed
    } else {
        SyncStatus::Partial
    };

    let per_context = all_contexts
        .iter()
        .map(|c| (c.clone(), responded.contains(&c.as_str())))
        .collect();

    let effectiveness = base_effectiveness(status) * time_factor(elapsed, timeout) * action_success_rate;

    SyncResult { id, contexts: all_contexts.to_vec(), status, per_context, effectiveness }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_contexts_acked_is_completed() {
        let acks = vec![ContextAck { context_id: "a".into(), state_fingerprint: "f1".into(), last_update_ms: 10 }];
        let result = build_sync_result(
            "sync-1".into(),
            &["a".to_string()],
            &acks,
            Duration::from_millis(100),
            Duration::from_secs(2),
            1.0,
        );
        assert_eq!(result.status, SyncStatus::Completed);
    }

    #[test]
    fn missing_one_of_two_is_partial() {
        let acks = vec![ContextAck { context_id: "a".into(), state_fingerprint: "f1".into(), last_update_ms: 10 }];
        let result = build_sync_result(
            "sync-1".into(),
            &["a".to_string(), "b".to_string()],
            &acks,
            Duration::from_millis(100),
            Duration::from_secs(2),
            1.0,
        );
        assert_eq!(result.status, SyncStatus::Partial);
    }

    #[test]
    fn aligned_state_picks_latest_by_timestamp() {
        let acks = vec![
            ContextAck { context_id: "a".into(), state_fingerprint: "old".into(), last_update_ms: 1 },
            ContextAck { context_id: "b".into(), state_fingerprint: "new".into(), last_update_ms: 99 },
        ];
        assert_eq!(aligned_state(&acks).unwrap().state_fingerprint, "new");
    }
}
