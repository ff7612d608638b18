//! # Pattern Module
//!
//! Compiles route pattern strings into matchers that test request paths and
//! extract named parameters.
//!
//! ## Overview
//!
//! A pattern is compiled once at registration time into a [`PathPattern`]
//! backed by a regex, then matched against the remaining request path on
//! every dispatch:
//!
//! 1. **Compilation**: pattern strings (e.g. `/pets/:id`) are converted into
//!    anchored regex patterns with one capture group per parameter. Malformed
//!    patterns fail here with a [`PatternError`]: a programmer error, never
//!    a per-request condition.
//!
//! 2. **Matching**: the compiled regex is tested against the path; on success
//!    the matcher reports how much of the path was consumed and the raw
//!    captured parameter values.
//!
//! ## Pattern syntax
//!
//! - literal segments: `/pets` matches exactly, honoring case sensitivity
//! - named parameters: `/pets/:id` captures one segment
//! - optional parameters: `/files/:name?` may capture zero segments
//! - wildcards: `/assets/*` captures the remainder (slashes included) into
//!   an indexed parameter (`"0"`, `"1"`, ...)
//!
//! Matching is deterministic: compiling the same pattern with the same
//! options always yields identical matching semantics.

mod core;

pub use core::{PathMatch, PathPattern, PatternError, PatternOptions};
pub use core::{ParamVec, MAX_INLINE_PARAMS};
