// SPDX-License-Identifier: MIT OR Apache-2.0

pub mod builtin;
pub mod matcher;
pub mod pattern_match;
pub mod spec;
pub mod window;

pub use matcher::PatternMatcher;
pub use pattern_match::PatternMatch;
pub use spec::{PatternSpec, Predicate, Severity};
