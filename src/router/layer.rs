//! The atomic dispatch unit: a path matcher paired with an endpoint.

use crate::chain::{ErrorHandler, Handler};
use crate::pattern::{PathMatch, PathPattern};
use crate::router::route::Route;
use crate::router::Router;
use std::sync::Arc;

/// What a matched layer invokes.
///
/// The variant fixes the error/normal distinction at registration time, so
/// dispatch never inspects handler shape at runtime.
pub(crate) enum Endpoint {
    Handler(Arc<dyn Handler>),
    ErrorHandler(Arc<dyn ErrorHandler>),
    Route(Route),
    Router(Arc<Router>),
}

/// One matchable, invokable unit in a router's chain.
///
/// Created at registration time, immutable thereafter. Match results are
/// per-request values returned to the caller, never stored on the layer, so
/// concurrent dispatches share the topology safely.
pub(crate) struct Layer {
    /// `None` matches any path and consumes nothing.
    pattern: Option<PathPattern>,
    pub(crate) endpoint: Endpoint,
}

impl Layer {
    pub(crate) fn new(pattern: Option<PathPattern>, endpoint: Endpoint) -> Self {
        Self { pattern, endpoint }
    }

    pub(crate) fn is_error_handler(&self) -> bool {
        matches!(self.endpoint, Endpoint::ErrorHandler(_))
    }

    /// Test this layer against the path remaining after the owning router's
    /// mount prefix.
    pub(crate) fn try_match(&self, path: &str) -> Option<PathMatch> {
        match &self.pattern {
            Some(pattern) => pattern.matches(path),
            None => Some(PathMatch::unconditional()),
        }
    }

    /// Pattern source for logging, `*` for pattern-less layers.
    pub(crate) fn pattern_source(&self) -> &str {
        self.pattern.as_ref().map_or("*", |p| p.source())
    }
}
