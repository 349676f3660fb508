// SPDX-License-Identifier: MIT OR Apache-2.0

//! Restricted wildcard matcher for event-type globs.
//!
//! Supports exact match, `prefix*`, `*suffix`, and a single middle `prefix*suffix`.
//! Deliberately not a regex: patterns with more than one `*` are rejected rather than
//! silently matched, per the design note against ad-hoc wildcard matching.

use crate::core::exception::PatternError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Glob {
    pattern: String,
}

impl Glob {
    pub fn new(pattern: impl Into<String>) -> Result<Self, PatternError> {
        let pattern = pattern.into();
        if pattern.matches('*').count() > 1 {
            return Err(PatternError::UnsupportedGlob(pattern));
        }
        Ok(Self { pattern })
    }

    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    pub fn matches(&self, event_type: &str) -> bool {
        match self.pattern.find('*') {
            None => self.pattern == event_type,
            Some(star) => {
                let prefix = &self.pattern[..star];
                let suffix = &self.pattern[star + 1..];
                event_type.len() >= prefix.len() + suffix.len()
                    && event_type.starts_with(prefix)
                    && event_type.ends_with(suffix)
            }
        }
    }
}

/// General multi-wildcard glob match (any number of `*`), used only by the
/// built-in pattern specs whose canonical form (`system*.*.degraded`) predates
/// the single-wildcard restriction placed on user-supplied specs. Not exposed
/// through `Glob::new` — see DESIGN.md for why the two grammars coexist.
pub fn matches_multi_wildcard(pattern: &str, event_type: &str) -> bool {
    let segments: Vec<&str> = pattern.split('*').collect();
    if segments.len() == 1 {
        return pattern == event_type;
    }
    let mut pos = 0usize;
    if !event_type[pos..].starts_with(segments[0]) {
        return false;
    }
    pos += segments[0].len();
    for seg in &segments[1..segments.len() - 1] {
        if seg.is_empty() {
            continue;
        }
        match event_type[pos..].find(seg) {
            Some(found) => pos += found + seg.len(),
            None => return false,
        }
    }
    let last = segments[segments.len() - 1];
    event_type.len() >= pos + last.len() && event_type[pos..].ends_with(last)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match() {
        let g = Glob::new("system1.operation.completed").unwrap();
        assert!(g.matches("system1.operation.completed"));
        assert!(!g.matches("system1.operation.timeout"));
    }

    #[test]
    fn prefix_match() {
        let g = Glob::new("algedonic.*").unwrap();
        assert!(g.matches("algedonic.pain.detected"));
        assert!(!g.matches("system5.policy.violated"));
    }

    #[test]
    fn suffix_match() {
        let g = Glob::new("*.degraded").unwrap();
        assert!(g.matches("system3.health.degraded"));
        assert!(!g.matches("system3.health.ok"));
    }

    #[test]
    fn middle_match() {
        let g = Glob::new("system*.degraded").unwrap();
        assert!(g.matches("system3.health.degraded"));
        assert!(g.matches("system.degraded"));
        assert!(!g.matches("system3.health.ok"));
    }

    #[test]
    fn rejects_multiple_wildcards() {
        assert!(Glob::new("system*.*.degraded").is_err());
    }

    #[test]
    fn middle_match_requires_room_for_both_parts() {
        let g = Glob::new("system*degraded").unwrap();
        assert!(!g.matches("sys"));
    }

    #[test]
    fn multi_wildcard_matches_algedonic_cascade_shape() {
        assert!(matches_multi_wildcard(
            "system*.*.degraded",
            "system3.health.degraded"
        ));
        assert!(!matches_multi_wildcard(
            "system*.*.degraded",
            "system3.health.ok"
        ));
        assert!(matches_multi_wildcard("emergent.*", "emergent.behavior.seen"));
    }
}
