// SPDX-License-Identifier: MIT OR Apache-2.0

//! Processor (C3): pull-based pipeline with four priority lanes, each with its
//! own concurrency, batch size and batch timeout.

pub mod classify;
pub mod dead_letter;
pub mod enrichment;
pub mod lane;

use crate::core::analytics::Analytics;
use crate::core::broker::Broker;
use crate::core::config::ProcessorConfig;
use crate::core::pattern::PatternMatcher;
use crate::core::producer::Producer;
use crate::core::store::EventStore;
use classify::Lane;
use enrichment::{enrich, EnrichedMessage};
use lane::LaneDeps;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex as AsyncMutex};
use tokio::task::JoinHandle;

const DISPATCH_PULL_BATCH: usize = 256;
const DISPATCH_POLL_INTERVAL_MS: u64 = 10;
const LANE_CHANNEL_CAPACITY: usize = 4096;

pub struct Processor {
    producer: Arc<Producer>,
    deps: Arc<LaneDeps>,
    config: ProcessorConfig,
}

impl Processor {
    pub fn new(
        producer: Arc<Producer>,
        store: Arc<EventStore>,
        pattern_matcher: Arc<PatternMatcher>,
        analytics: Arc<Analytics>,
        broker: Arc<dyn Broker>,
        config: ProcessorConfig,
        node_id: impl Into<String>,
    ) -> Self {
        Self {
            producer,
            deps: Arc::new(LaneDeps { store, pattern_matcher, analytics, broker, node_id: node_id.into() }),
            config,
        }
    }

    fn lane_config(&self, lane: Lane) -> crate::core::config::LaneConfig {
        match lane {
            Lane::HighPriority => self.config.high_priority.clone(),
            Lane::NormalPriority => self.config.normal_priority.clone(),
            Lane::Analytics => self.config.analytics.clone(),
            Lane::PatternMatching => self.config.pattern_matching.clone(),
        }
    }

    /// Spawns the dispatch loop (demand-pull from the Producer, enrich,
    /// classify, route to the matching lane channel) plus every lane's
    /// worker pool. Returns every spawned task's handle for the Supervisor.
    pub fn spawn(self: &Arc<Self>) -> Vec<JoinHandle<()>> {
        let mut handles = Vec::new();
        let mut senders = std::collections::HashMap::new();

        for lane in Lane::all() {
            let lane_config = self.lane_config(lane);
            let (tx, rx) = mpsc::channel::<EnrichedMessage>(LANE_CHANNEL_CAPACITY);
            senders.insert(lane, tx);
            let shared_rx = Arc::new(AsyncMutex::new(rx));
            for _ in 0..lane_config.concurrency.max(1) {
                let deps = Arc::clone(&self.deps);
                let shared_rx = Arc::clone(&shared_rx);
                let batch_size = lane_config.batch_size.max(1);
                let batch_timeout = Duration::from_millis(lane_config.batch_timeout_ms.max(1));
                handles.push(tokio::spawn(async move {
                    lane_worker_loop(lane, shared_rx, batch_size, batch_timeout, deps).await;
                }));
            }
        }

        let producer = Arc::clone(&self.producer);
        handles.push(tokio::spawn(async move {
            dispatch_loop(producer, senders).await;
        }));

        handles
    }
}

async fn dispatch_loop(producer: Arc<Producer>, senders: std::collections::HashMap<Lane, mpsc::Sender<EnrichedMessage>>) {
    let mut ticker = tokio::time::interval(Duration::from_millis(DISPATCH_POLL_INTERVAL_MS));
    loop {
        ticker.tick().await;
        let pulled = producer.pull(DISPATCH_PULL_BATCH);
        for message in pulled {
            let enriched = enrich(message);
            if let Some(tx) = senders.get(&enriched.lane) {
                let _ = tx.send(enriched).await;
            }
        }
    }
}

async fn lane_worker_loop(
    lane: Lane,
    rx: Arc<AsyncMutex<mpsc::Receiver<EnrichedMessage>>>,
    batch_size: usize,
    batch_timeout: Duration,
    deps: Arc<LaneDeps>,
) {
    loop {
        let mut batch = Vec::with_capacity(batch_size);
        let deadline = tokio::time::sleep(batch_timeout);
        tokio::pin!(deadline);

        loop {
            let next = {
                let mut guard = rx.lock().await;
                tokio::select! {
                    biased;
                    msg = guard.recv() => Some(msg),
                    _ = &mut deadline, if !batch.is_empty() => None,
                }
            };
            match next {
                Some(Some(msg)) => {
                    batch.push(msg);
                    if batch.len() >= batch_size {
                        break;
                    }
                }
                Some(None) => return,
                None => break,
            }
        }

        if !batch.is_empty() {
            lane::handle_batch(lane, batch, &deps).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::broker::InProcessBroker;
    use crate::core::event::{NewEvent, Value};
    use crate::core::pattern::PatternMatcher;
    use crate::core::persistence::InMemoryBackend;
    use crate::core::producer::Producer;
    use std::sync::Arc;

    fn build_processor() -> (Arc<Processor>, Arc<EventStore>) {
        let store = Arc::new(EventStore::new(Arc::new(InMemoryBackend::new())));
        let broker = Arc::new(InProcessBroker::new("node-1", 16));
        let analytics = Arc::new(Analytics::new());
        let matcher = Arc::new(PatternMatcher::new(30_000, 1000, Arc::new(crate::core::broker::BroadcastDispatcher::new(broker.clone(), "node-1")), store.clone(), analytics.clone(), "node-1"));
        let producer = Arc::new(Producer::new(1000));
        let processor = Arc::new(Processor::new(
            producer.clone(),
            store.clone(),
            matcher,
            analytics,
            broker,
            ProcessorConfig::default(),
            "node-1",
        ));
        (processor, store)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn classify_routes_plain_event_to_normal_priority_lane_and_it_gets_persisted() {
        let (processor, store) = build_processor();
        let handles = processor.spawn();
        processor.producer.inject(NewEvent::new("orders.created", Value::Null));

        tokio::time::sleep(Duration::from_millis(300)).await;
        let events = store.read_stream("orders.created", 0, 10);
        assert!(!events.is_empty());

        for h in handles {
            h.abort();
        }
    }
}
