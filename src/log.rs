//! Diagnostics plumbing (spec.md §6 "Context API", §9 "Global debug state").
//!
//! The teacher routes all diagnostics through a per-production `Log<T>`
//! level plus `assign_debugger`/`log_entry`/`log_success`/`log_error`
//! helpers compiled out under release builds. spec.md calls for exactly two
//! callbacks on the context, invoked synchronously, that must not re-enter
//! the engine — no verbosity grading of what they receive — so this crate
//! keeps only the callback slots themselves, not the teacher's graded level.

/// Invoked synchronously from within `load_rulebase`/`normalize`. Must not
/// re-enter the engine (spec.md §6).
pub type DebugCallback = Box<dyn Fn(&str)>;
/// Invoked synchronously when the compiler hits a rulebase syntax error
/// (spec.md §7); receives the same message carried in [`crate::CompileError`].
pub type ErrorCallback = Box<dyn Fn(&str)>;
