// SPDX-License-Identifier: MIT OR Apache-2.0

//! Attention Engine (C6): multi-dimensional salience scoring that modulates
//! message routing, filtering, backpressure and oscillation damping decisions
//! made elsewhere in the substrate.

pub mod engine;
pub mod message;
pub mod scoring;
pub mod state;
pub mod window;

pub use engine::{AttentionEngine, ScoredOutcome};
pub use message::{Priority, ScoredMessage};
pub use state::AttentionState;
pub use window::TemporalScale;
