//! A library for normalizing free-form log lines into structured records
//! against a user-supplied rulebase of tagged sample patterns.
//!
//! # Overview
//!
//! Log messages from different subsystems rarely share a common shape, but
//! most of them are built from the same handful of primitives: timestamps,
//! IP addresses, quoted strings, key/value lists. Rather than writing a
//! custom parser per log source, this crate compiles a small rulebase
//! language — one line per sample pattern, interleaved literal text and
//! typed field references — into a shared parse graph ([`pdag`]) and
//! matches input lines against it with a single recursive backtracking
//! matcher ([`matcher`]).
//!
//! A [`Context`] owns the compiled rulebase (its main graph, any
//! user-defined named types, and tag-keyed annotations) and exposes one
//! entry point, [`Context::normalize`], that turns an input line into a
//! [`Value`]: on a full match, the captured fields plus `event.tags` plus
//! any annotation-added fields; on no match, the original message and the
//! unparsed suffix starting at the furthest offset the matcher reached.
//!
//! # Example
//!
//! ```
//! use log_pdag::Context;
//!
//! let mut ctx = Context::new();
//! ctx.load_rulebase_str(concat!(
//!     "version=2\n",
//!     "rule=[login]:user %u:word% in\n",
//!     "annotate=login:+origin=\"syslog\"\n",
//! ));
//!
//! let result = ctx.normalize(b"user alice in");
//! println!("{}", result);
//! ```

mod annotation;
mod compiler;
mod context;
mod error;
mod json_scan;
mod log;
mod matcher;
mod optimizer;
pub mod parsers;
mod pdag;
mod value;

pub use context::Context;
pub use error::{CompileError, ContextError};
pub use log::{DebugCallback, ErrorCallback};
pub use value::{Fields, Value};
