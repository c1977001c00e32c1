//! Error types surfaced to callers (spec.md §7).
//!
//! Hand-written `Display` impls rather than a `thiserror` derive, matching
//! how the teacher's own `ImplementationError`/`ParseError` are implemented.

use std::fmt::{self, Display, Formatter};

/// A rulebase syntax error: unknown directive, malformed field reference,
/// unknown parser kind, invalid configuration, an over-long field name, a
/// bad type name, ... (spec.md §7). Carries the line number so a caller can
/// report context; loading continues past the offending line.
#[derive(Debug, Clone)]
pub struct CompileError {
    pub line: usize,
    pub message: String,
}

impl CompileError {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

impl Display for CompileError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "rulebase syntax error at line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for CompileError {}

/// Bad-context / use-after-destroy style error (spec.md §7's "sentinel
/// magic"). A [`crate::Context`] does not expose unsafe teardown, so the
/// only way to hit this in safe Rust is to reference a type or option this
/// context never defined.
#[derive(Debug, Clone)]
pub struct ContextError {
    pub message: String,
}

impl ContextError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Display for ContextError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "context error: {}", self.message)
    }
}

impl std::error::Error for ContextError {}

/// Internal, never surfaced to callers: a parser's own "this is not my
/// input" signal (spec.md §4.A "WRONG_PARSER"). Backtracking in the matcher
/// consumes this silently; only exhaustion of all edges at the root produces
/// a non-match result object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WrongParser;

impl Display for WrongParser {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("wrong parser")
    }
}
