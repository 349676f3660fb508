// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::core::event::Event;
use crate::core::exception::PatternError;
use crate::core::util::glob::matches_multi_wildcard;
use crate::core::util::Glob;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        }
    }
}

pub type Predicate = std::sync::Arc<dyn Fn(&[Event]) -> bool + Send + Sync>;

/// A configured pattern: which event types it watches, what must be true of the
/// relevant window-slice, and what happens on a match (§3, §4.4).
#[derive(Clone)]
pub struct PatternSpec {
    pub name: String,
    pub event_type_globs: Vec<String>,
    pub predicate: Predicate,
    pub severity: Severity,
    pub action_tag: String,
}

impl PatternSpec {
    /// User-supplied specs go through the restricted single-wildcard grammar.
    pub fn new_user_defined(
        name: impl Into<String>,
        event_type_globs: Vec<String>,
        predicate: Predicate,
        severity: Severity,
        action_tag: impl Into<String>,
    ) -> Result<Self, PatternError> {
        for glob in &event_type_globs {
            Glob::new(glob.as_str())?;
        }
        Ok(Self {
            name: name.into(),
            event_type_globs,
            predicate,
            severity,
            action_tag: action_tag.into(),
        })
    }

    /// Built-in specs reproduce the canonical table exactly, including
    /// `system*.*.degraded`'s two wildcards — see DESIGN.md.
    pub fn new_builtin(
        name: impl Into<String>,
        event_type_globs: Vec<&str>,
        predicate: Predicate,
        severity: Severity,
        action_tag: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            event_type_globs: event_type_globs.into_iter().map(String::from).collect(),
            predicate,
            severity,
            action_tag: action_tag.into(),
        }
    }

    pub fn matches_event_type(&self, event_type: &str) -> bool {
        self.event_type_globs
            .iter()
            .any(|g| matches_multi_wildcard(g, event_type))
    }
}
