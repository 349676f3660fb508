// SPDX-License-Identifier: MIT OR Apache-2.0

pub mod glob;
pub mod hash;
pub mod metrics;
pub mod pipeline;
pub mod time;

pub use self::glob::Glob;
pub use self::hash::fingerprint;
pub use self::time::{monotonic_now_ms, wall_clock_now};
