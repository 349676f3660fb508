// SPDX-License-Identifier: MIT OR Apache-2.0

//! Supervisor / Lifecycle (C9): bounded-restart orchestration of every other
//! component. Starts children in a fixed order, restarts only the child that
//! failed, and escalates (terminating the whole group) past the restart
//! budget (§4.9).

pub mod child;
pub mod restart_budget;

pub use child::ChildSpec;

use crate::core::config::SupervisorConfig;
use crate::core::exception::SupervisorError;
use crate::core::util::monotonic_now_ms;
use futures::future::select_all;
use restart_budget::RestartBudget;
use std::future::Future;
use std::pin::Pin;
use tokio::task::{AbortHandle, JoinError};
use tracing::{error, info, warn};

type ChildFuture = Pin<Box<dyn Future<Output = (usize, Result<(), JoinError>)> + Send>>;

fn spawn_child(idx: usize, child: &ChildSpec, abort_handles: &mut [Option<AbortHandle>]) -> ChildFuture {
    let handle = (child.spawn)();
    abort_handles[idx] = Some(handle.abort_handle());
    Box::pin(async move { (idx, handle.await) })
}

/// Runs the supervised group to completion (i.e. until escalation). Starts
/// every child in `children`'s order, then restarts whichever child's task
/// ends (normally or by panic) until one exceeds its restart budget.
pub async fn supervise(children: Vec<ChildSpec>, config: SupervisorConfig) -> Result<(), SupervisorError> {
    let mut budget = RestartBudget::new(config.max_restarts, config.restart_window_secs * 1000);
    let mut abort_handles: Vec<Option<AbortHandle>> = vec![None; children.len()];

    let mut futs: Vec<ChildFuture> = children
        .iter()
        .enumerate()
        .map(|(idx, child)| {
            info!(child = child.name, "supervisor starting child");
            spawn_child(idx, child, &mut abort_handles)
        })
        .collect();

    loop {
        if futs.is_empty() {
            return Ok(());
        }
        let ((idx, result), _pos, remaining) = select_all(futs).await;
        futs = remaining;

        let child = &children[idx];
        match &result {
            Ok(()) => warn!(child = child.name, "supervised child exited, restarting"),
            Err(e) => error!(child = child.name, error = %e, "supervised child panicked, restarting"),
        }

        let now_ms = monotonic_now_ms();
        if budget.record_and_check(child.name, now_ms) {
            error!(child = child.name, "restart budget exceeded, escalating");
            for handle in abort_handles.iter().flatten() {
                handle.abort();
            }
            return Err(SupervisorError::RestartBudgetExceeded(child.name.to_string()));
        }

        futs.push(spawn_child(idx, child, &mut abort_handles));
    }
}

/// Canonical startup order (§4.9). Callers build `ChildSpec`s for each
/// component and pass them to `supervise` in this order.
pub const STARTUP_ORDER: [&str; 7] = [
    "event_store",
    "producer",
    "pattern_matcher",
    "analytics",
    "processor",
    "coordinator",
    "broker_adapter",
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn escalates_after_exceeding_restart_budget() {
        let spawn_count = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&spawn_count);
        let child = ChildSpec::new("flaky", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(async {})
        });

        let config = SupervisorConfig { max_restarts: 2, restart_window_secs: 60 };
        let result = supervise(vec![child], config).await;
        assert!(matches!(result, Err(SupervisorError::RestartBudgetExceeded(name)) if name == "flaky"));
        assert!(spawn_count.load(Ordering::SeqCst) >= 3);
    }
}
