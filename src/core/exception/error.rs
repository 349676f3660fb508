// SPDX-License-Identifier: MIT OR Apache-2.0

use thiserror::Error;

/// Errors raised by the append-only event store (C1).
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    #[error("concurrency conflict on stream `{stream_id}`: expected {expected}, current is {current}")]
    ConcurrencyConflict {
        stream_id: String,
        expected: u64,
        current: u64,
    },
    #[error("subscriber is dead and was removed")]
    SubscriberDead,
}

/// Errors raised by the producer (C2).
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ProducerError {
    #[error("buffer overflow, oldest event dropped")]
    BufferOverflowDropped,
}

/// Errors raised by the processor (C3).
#[derive(Debug, Clone, Error)]
pub enum ProcessorError {
    #[error("processing failed: {reason}")]
    ProcessingFailed { reason: String },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors raised by the pattern matcher (C4).
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PatternError {
    #[error("pattern `{0}` has more than one wildcard `*`, which is not supported")]
    UnsupportedGlob(String),
}

/// Errors raised by the attention engine (C6).
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AttentionError {
    #[error("unknown context id `{0}`")]
    UnknownContext(String),
}

/// Errors raised by the coordinator (C7).
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CoordinatorError {
    #[error("message blocked: low attention score {score:.3} < threshold {threshold:.3}")]
    LowAttention { score: f64, threshold: f64 },
    #[error("message rate limited, delayed {delayed_ms}ms")]
    RateLimited { delayed_ms: u64 },
    #[error("conflict detected: {kind}, delayed {delayed_ms}ms")]
    Conflict { kind: String, delayed_ms: u64 },
    #[error("synchronization timed out")]
    SyncTimeout,
    #[error("synchronization partially completed, missing: {missing:?}")]
    SyncPartial { missing: Vec<String> },
}

/// Errors raised by the broker adapter (C8).
#[derive(Debug, Clone, Error, PartialEq)]
pub enum BrokerError {
    #[error("no subscriber for topic `{0}`")]
    NoSubscriber(String),
    #[error("message `{0}` was not found in the unacked set")]
    UnknownMessage(String),
}

/// Errors raised while loading or validating configuration.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("failed to read configuration file `{path}`: {reason}")]
    Io { path: String, reason: String },
    #[error("failed to parse configuration: {0}")]
    Parse(String),
    #[error("configuration invalid:\n{}", .0.join("\n"))]
    Invalid(Vec<String>),
}

/// Errors raised by the supervisor (C9).
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SupervisorError {
    #[error("child `{0}` escalated after exceeding the restart budget")]
    RestartBudgetExceeded(String),
}

/// Unified error crossing a subsystem boundary (CLI, supervisor escalation, tests).
///
/// Internal call sites keep their precise error type; this enum only exists for the
/// outermost layers that genuinely need to handle every kind of failure uniformly.
#[derive(Debug, Clone, Error)]
pub enum SubstrateError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Producer(#[from] ProducerError),
    #[error(transparent)]
    Processor(#[from] ProcessorError),
    #[error(transparent)]
    Pattern(#[from] PatternError),
    #[error(transparent)]
    Attention(#[from] AttentionError),
    #[error(transparent)]
    Coordinator(#[from] CoordinatorError),
    #[error(transparent)]
    Broker(#[from] BrokerError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Supervisor(#[from] SupervisorError),
}

pub type SubstrateResult<T> = Result<T, SubstrateError>;
