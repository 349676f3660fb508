// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence contract the Event Store writes through.
//!
//! The Event Store owns stream semantics (versions, optimistic concurrency); this
//! module only specifies how committed batches reach durable storage. Swapping
//! `InMemoryBackend` for a real log/database means implementing one trait.

pub mod backend;

pub use backend::{InMemoryBackend, NullBackend, PersistenceBackend};
