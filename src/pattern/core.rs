//! Pattern core module - hot path for path matching.

use regex::{Regex, RegexBuilder};
use smallvec::SmallVec;
use std::sync::Arc;
use thiserror::Error;

/// Maximum number of path parameters before heap allocation.
/// Most route patterns have ≤4 parameters (e.g. `/users/:id/posts/:post_id`).
pub const MAX_INLINE_PARAMS: usize = 8;

/// Stack-allocated parameter storage for the hot path.
/// Uses `SmallVec` to avoid heap allocation for routes with ≤8 params.
///
/// Param names use `Arc<str>` instead of `String` because names come from the
/// static pattern (known at registration) and `Arc::clone()` is O(1); values
/// remain `String` as they are per-request data from the URL.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Compile-time failure for a route pattern string.
///
/// These are programmer errors: the registration surface fails fast on them
/// and dispatch never sees a malformed pattern.
#[derive(Debug, Error)]
pub enum PatternError {
    #[error("route pattern must start with '/': {pattern:?}")]
    MissingLeadingSlash { pattern: String },
    #[error("route pattern {pattern:?} has a parameter with no name")]
    EmptyParamName { pattern: String },
    #[error("invalid character {ch:?} in parameter name {name:?} (use ASCII letters, digits, '_')")]
    InvalidParamName { ch: char, name: String },
    #[error("route pattern {pattern:?} contains an empty segment")]
    EmptySegment { pattern: String },
    #[error("route pattern {pattern:?} did not compile: {source}")]
    Regex {
        pattern: String,
        source: regex::Error,
    },
}

/// Options fixed at compile time for a [`PathPattern`].
#[derive(Debug, Clone, Copy)]
pub struct PatternOptions {
    /// Literal segments match case-sensitively.
    pub case_sensitive: bool,
    /// Trailing slash must match exactly; otherwise a pattern without one
    /// also matches a path with exactly one trailing slash, and vice versa.
    pub strict: bool,
    /// Anchor the match at the end of the path. When `false` the pattern
    /// matches a *prefix* of the path ending on a segment boundary, and the
    /// match reports the consumed length for delegation to a nested router.
    pub end: bool,
}

impl Default for PatternOptions {
    fn default() -> Self {
        Self {
            case_sensitive: false,
            strict: false,
            end: true,
        }
    }
}

/// Result of successfully matching a path against a [`PathPattern`].
#[derive(Debug, Clone)]
pub struct PathMatch {
    /// How many bytes of the path the pattern consumed. For end-anchored
    /// patterns this is the whole path; for prefix patterns the caller uses
    /// it to compute the suffix handed to a nested router.
    pub consumed: usize,
    /// Captured parameters, raw (not yet percent-decoded), in pattern order.
    pub params: ParamVec,
}

impl PathMatch {
    /// Match produced by a layer with no pattern: matches any path and
    /// consumes nothing.
    #[must_use]
    pub fn unconditional() -> Self {
        Self {
            consumed: 0,
            params: ParamVec::new(),
        }
    }
}

/// Immutable compiled form of a route pattern string.
///
/// Compilation is deterministic: the same pattern and options always yield a
/// matcher with identical semantics, and all failures surface at compile
/// time via [`PatternError`].
#[derive(Debug, Clone)]
pub struct PathPattern {
    source: String,
    regex: Regex,
    keys: Vec<Arc<str>>,
    end: bool,
    /// Pattern `/` in prefix mode: matches every path and consumes nothing,
    /// so a router mounted at the root sees the full path.
    fast_slash: bool,
}

impl PathPattern {
    /// Compile a pattern string into a matcher.
    pub fn compile(pattern: &str, options: PatternOptions) -> Result<Self, PatternError> {
        if !pattern.starts_with('/') {
            return Err(PatternError::MissingLeadingSlash {
                pattern: pattern.to_string(),
            });
        }

        let fast_slash = pattern == "/" && !options.end;
        let trailing_slash = pattern.len() > 1 && pattern.ends_with('/');
        let body = if pattern == "/" {
            pattern
        } else {
            pattern.trim_end_matches('/')
        };

        let mut regex_src = String::with_capacity(pattern.len() + 8);
        regex_src.push('^');
        let mut keys: Vec<Arc<str>> = Vec::new();
        let mut wildcards = 0usize;

        if pattern == "/" {
            regex_src.push('/');
        } else {
            for segment in body.split('/').skip(1) {
                if let Some(rest) = segment.strip_prefix(':') {
                    let (name, optional) = match rest.strip_suffix('?') {
                        Some(name) => (name, true),
                        None => (rest, false),
                    };
                    if name.is_empty() {
                        return Err(PatternError::EmptyParamName {
                            pattern: pattern.to_string(),
                        });
                    }
                    if let Some(ch) = name
                        .chars()
                        .find(|c| !c.is_ascii_alphanumeric() && *c != '_')
                    {
                        return Err(PatternError::InvalidParamName {
                            ch,
                            name: name.to_string(),
                        });
                    }
                    regex_src.push_str(if optional {
                        "(?:/([^/]+))?"
                    } else {
                        "/([^/]+)"
                    });
                    keys.push(Arc::from(name));
                } else if segment == "*" {
                    regex_src.push_str("/(.*)");
                    keys.push(Arc::from(wildcards.to_string().as_str()));
                    wildcards += 1;
                } else if segment.is_empty() {
                    return Err(PatternError::EmptySegment {
                        pattern: pattern.to_string(),
                    });
                } else {
                    regex_src.push('/');
                    regex_src.push_str(&regex::escape(segment));
                }
            }
        }

        if options.end {
            if options.strict {
                if trailing_slash {
                    regex_src.push('/');
                }
                regex_src.push('$');
            } else {
                regex_src.push_str("/?$");
            }
        } else if options.strict && trailing_slash {
            regex_src.push('/');
        }

        let regex = RegexBuilder::new(&regex_src)
            .case_insensitive(!options.case_sensitive)
            .build()
            .map_err(|source| PatternError::Regex {
                pattern: pattern.to_string(),
                source,
            })?;

        Ok(Self {
            source: pattern.to_string(),
            regex,
            keys,
            end: options.end,
            fast_slash,
        })
    }

    /// The pattern string this matcher was compiled from.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Parameter names captured by this pattern, in pattern order.
    #[must_use]
    pub fn keys(&self) -> &[Arc<str>] {
        &self.keys
    }

    /// Test a path against this pattern.
    ///
    /// Prefix patterns (`end: false`) only match when the consumed portion
    /// ends on a segment boundary, so `/api` matches `/api/items` but never
    /// `/apifoo`.
    #[must_use]
    pub fn matches(&self, path: &str) -> Option<PathMatch> {
        if self.fast_slash {
            return Some(PathMatch::unconditional());
        }

        let caps = self.regex.captures(path)?;
        let full = caps.get(0)?;
        let consumed = full.end();

        if !self.end {
            let bytes = path.as_bytes();
            let boundary = consumed == bytes.len()
                || bytes.get(consumed) == Some(&b'/')
                || (consumed > 0 && bytes.get(consumed - 1) == Some(&b'/'));
            if !boundary {
                return None;
            }
        }

        let mut params = ParamVec::new();
        for (i, key) in self.keys.iter().enumerate() {
            // optional parameters may not have captured anything
            if let Some(m) = caps.get(i + 1) {
                params.push((Arc::clone(key), m.as_str().to_string()));
            }
        }

        Some(PathMatch { consumed, params })
    }
}
