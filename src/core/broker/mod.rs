// SPDX-License-Identifier: MIT OR Apache-2.0

pub mod action_dispatcher;
pub mod broker_trait;
pub mod envelope;
pub mod in_process;
pub mod topics;

pub use action_dispatcher::{ActionDispatcher, BroadcastDispatcher};
pub use broker_trait::Broker;
pub use envelope::Envelope;
pub use in_process::InProcessBroker;
