// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared buffer-accounting primitives used by the Producer's bounded channel.

pub mod backpressure;

pub use backpressure::DropOldestCounter;

pub use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
pub use crossbeam_queue::{ArrayQueue, SegQueue};
pub use crossbeam_utils::CachePadded;
