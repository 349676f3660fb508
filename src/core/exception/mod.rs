// SPDX-License-Identifier: MIT OR Apache-2.0

pub mod error;

pub use error::{
    AttentionError, BrokerError, ConfigError, CoordinatorError, PatternError, ProcessorError,
    ProducerError, StoreError, SubstrateError, SubstrateResult, SupervisorError,
};
