// SPDX-License-Identifier: MIT OR Apache-2.0

use std::sync::Arc;
use tokio::task::JoinHandle;

/// A supervised unit: a name (for logging/restart accounting) and a factory
/// that spawns a fresh task each time it (re)starts. Idempotent factories let
/// the Supervisor rebuild subscriptions and buffers from scratch on restart
/// (§4.9) rather than trying to resume in-flight state.
pub struct ChildSpec {
    pub name: &'static str,
    pub spawn: Arc<dyn Fn() -> JoinHandle<()> + Send + Sync>,
}

impl ChildSpec {
    pub fn new(name: &'static str, spawn: impl Fn() -> JoinHandle<()> + Send + Sync + 'static) -> Self {
        Self { name, spawn: Arc::new(spawn) }
    }
}
