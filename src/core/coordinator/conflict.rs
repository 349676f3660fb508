// SPDX-License-Identifier: MIT OR Apache-2.0

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    SimultaneousAccess,
    CircularDependency,
    ResourceContention,
}

impl std::fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ConflictKind::SimultaneousAccess => "simultaneous_access",
            ConflictKind::CircularDependency => "circular_dependency",
            ConflictKind::ResourceContention => "resource_contention",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone)]
pub struct ConflictRecord {
    pub kind: ConflictKind,
    pub from: String,
    pub to: String,
    pub delayed_ms: u64,
    pub resolved_at_ms: u64,
}

/// Delay applied on conflict: 20ms if attention score > 0.7, else 50ms (§4.7).
pub fn conflict_delay_ms(score: f64) -> u64 {
    if score > 0.7 {
        20
    } else {
        50
    }
}
