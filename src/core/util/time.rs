// SPDX-License-Identifier: MIT OR Apache-2.0

//! Time handling: monotonic clock for intervals/latencies, wall clock only for
//! timestamps that get stored. The two are never compared against each other.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use std::time::Instant;

static PROCESS_START: Lazy<Instant> = Lazy::new(Instant::now);

/// Milliseconds elapsed since this process started. Only meaningful for
/// computing *intervals* within the same process; never serialize this value.
pub fn monotonic_now_ms() -> u64 {
    PROCESS_START.elapsed().as_millis() as u64
}

/// Current wall-clock time, used only for values that get stored or shown to a user.
pub fn wall_clock_now() -> DateTime<Utc> {
    Utc::now()
}
