// SPDX-License-Identifier: MIT OR Apache-2.0

//! Single configuration aggregate covering every tunable in the external
//! interface (§6): buffer size, lane concurrency/batch size/timeout, pattern
//! window, attention weights, fatigue/recovery rates, coordination thresholds,
//! broker connection info. Loadable from YAML with `${VAR}`/`${VAR:-default}`
//! environment substitution, and hot-reloadable via a `tokio::sync::watch` channel.

pub mod loader;
pub mod validator;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProducerConfig {
    pub buffer_capacity: usize,
    pub poll_interval_ms: u64,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: 1000,
            poll_interval_ms: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaneConfig {
    pub concurrency: usize,
    pub batch_size: usize,
    pub batch_timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    pub high_priority: LaneConfig,
    pub normal_priority: LaneConfig,
    pub analytics: LaneConfig,
    pub pattern_matching: LaneConfig,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            high_priority: LaneConfig {
                concurrency: 4,
                batch_size: 100,
                batch_timeout_ms: 50,
            },
            normal_priority: LaneConfig {
                concurrency: 8,
                batch_size: 100,
                batch_timeout_ms: 50,
            },
            analytics: LaneConfig {
                concurrency: 2,
                batch_size: 50,
                batch_timeout_ms: 100,
            },
            pattern_matching: LaneConfig {
                concurrency: 6,
                batch_size: 20,
                batch_timeout_ms: 25,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    pub window_ms: u64,
    pub window_capacity: usize,
    pub history_capacity: usize,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            window_ms: 30_000,
            window_capacity: 1000,
            history_capacity: 100,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttentionWeights {
    pub novelty: f64,
    pub urgency: f64,
    pub relevance: f64,
    pub intensity: f64,
    pub coherence: f64,
}

impl Default for AttentionWeights {
    fn default() -> Self {
        Self {
            novelty: 0.30,
            urgency: 0.25,
            relevance: 0.20,
            intensity: 0.15,
            coherence: 0.10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttentionConfig {
    pub weights: AttentionWeights,
    pub fatigue_decay_per_tick: f64,
    pub context_decay_factor: f64,
    pub high_salience_threshold: f64,
    pub append_threshold: f64,
    pub filter_default_threshold: f64,
}

impl Default for AttentionConfig {
    fn default() -> Self {
        Self {
            weights: AttentionWeights::default(),
            fatigue_decay_per_tick: 0.01,
            context_decay_factor: 0.95,
            high_salience_threshold: 0.8,
            append_threshold: 0.3,
            filter_default_threshold: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    pub low_attention_threshold: f64,
    pub bypass_threshold: f64,
    pub sync_threshold: f64,
    pub base_rate_per_sec: f64,
    pub oscillation_window_ms: u64,
    pub oscillation_threshold: f64,
    pub oscillation_crisis_count: u32,
    pub simultaneous_access_window_ms: u64,
    pub sync_ack_timeout_ms: u64,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            low_attention_threshold: 0.2,
            bypass_threshold: 0.8,
            sync_threshold: 0.9,
            base_rate_per_sec: 100.0,
            oscillation_window_ms: 5_000,
            oscillation_threshold: 0.5,
            oscillation_crisis_count: 5,
            simultaneous_access_window_ms: 10,
            sync_ack_timeout_ms: 2_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    pub connection_uri: String,
    pub topic_channel_capacity: usize,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            connection_uri: "inproc://vsm-substrate".to_string(),
            topic_channel_capacity: 1024,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupervisorConfig {
    pub max_restarts: u32,
    pub restart_window_secs: u64,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            max_restarts: 10,
            restart_window_secs: 60,
        }
    }
}

/// The full set of tunables for one running substrate instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SubstrateConfig {
    pub producer: ProducerConfig,
    pub processor: ProcessorConfig,
    pub pattern: PatternConfig,
    pub attention: AttentionConfig,
    pub coordinator: CoordinatorConfig,
    pub broker: BrokerConfig,
    pub supervisor: SupervisorConfig,
}

pub use loader::load_from_file;
pub use validator::validate;
