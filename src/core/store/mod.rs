// SPDX-License-Identifier: MIT OR Apache-2.0

pub mod event_store;
pub mod model;
pub mod subscriber;

pub use event_store::EventStore;
pub use model::{AppendOutcome, ExpectedVersion, Snapshot, StreamMeta, SubscriptionKind};
