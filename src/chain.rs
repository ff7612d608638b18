//! Continuation primitives driving the dispatch chain.
//!
//! Every handler receives a [`Next`] continuation and advances the chain by
//! invoking it: [`Next::proceed`] moves to the next matching layer,
//! [`Next::error`] switches the chain into error mode carrying a
//! [`ChainError`], and [`Next::skip_route`] ends only the current route's
//! handler list. A handler that never invokes its continuation terminates the
//! chain; it is assumed to have produced the response itself.
//!
//! The per-request bookkeeping lives in [`DispatchState`]: the chain mode
//! (normal or error, with the in-flight error value), the set of parameter
//! hooks already fired, and the method capability list collected for
//! `OPTIONS`/405 handling. One `DispatchState` is created per request and is
//! never shared; the router topology itself is immutable during dispatch.

use crate::request::Request;
use crate::response::Response;
use http::{Method, StatusCode};
use std::cell::Cell;
use std::collections::HashMap;
use std::fmt;
use tracing::warn;

/// Dynamic error value carried through the chain while in error mode.
///
/// This is the engine's analog of passing an arbitrary error to a
/// continuation: the payload is an [`anyhow::Error`], optionally tagged with
/// the HTTP status the terminal fallback should use. Anything convertible
/// into `anyhow::Error` converts into a `ChainError`, as do plain strings.
#[derive(Debug)]
pub struct ChainError {
    status: Option<StatusCode>,
    source: anyhow::Error,
}

impl ChainError {
    /// Wrap an error value with no particular status (the fallback uses 500).
    pub fn new(source: impl Into<anyhow::Error>) -> Self {
        Self {
            status: None,
            source: source.into(),
        }
    }

    /// Build an error from a displayable message.
    pub fn msg<M>(msg: M) -> Self
    where
        M: fmt::Display + fmt::Debug + Send + Sync + 'static,
    {
        Self {
            status: None,
            source: anyhow::Error::msg(msg),
        }
    }

    /// Wrap an error value and pin the status the fallback should respond with.
    pub fn with_status(status: StatusCode, source: impl Into<anyhow::Error>) -> Self {
        Self {
            status: Some(status),
            source: source.into(),
        }
    }

    /// Build a status-tagged error from a displayable message.
    pub fn status_msg<M>(status: StatusCode, msg: M) -> Self
    where
        M: fmt::Display + fmt::Debug + Send + Sync + 'static,
    {
        Self {
            status: Some(status),
            source: anyhow::Error::msg(msg),
        }
    }

    /// Status for the terminal response, defaulting to 500 when untagged.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// The wrapped error value.
    #[must_use]
    pub fn inner(&self) -> &anyhow::Error {
        &self.source
    }
}

impl fmt::Display for ChainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.source.fmt(f)
    }
}

impl From<anyhow::Error> for ChainError {
    fn from(source: anyhow::Error) -> Self {
        Self::new(source)
    }
}

impl From<&'static str> for ChainError {
    fn from(msg: &'static str) -> Self {
        Self::msg(msg)
    }
}

impl From<String> for ChainError {
    fn from(msg: String) -> Self {
        Self::msg(msg)
    }
}

/// What a continuation invocation asked the chain to do next.
#[derive(Debug)]
pub(crate) enum Flow {
    Proceed,
    Fail(ChainError),
    SkipRoute,
}

/// The continuation handed to every handler, error handler, and param hook.
///
/// Exactly one invocation per chain step is allowed; extra invocations are a
/// caller error, surfaced as a warning and ignored so downstream handlers
/// cannot double-fire.
pub struct Next {
    invoked: Cell<bool>,
    slot: Cell<Option<Flow>>,
}

impl Next {
    pub(crate) fn new() -> Self {
        Self {
            invoked: Cell::new(false),
            slot: Cell::new(None),
        }
    }

    /// Advance to the next matching layer, staying in (or restoring) normal mode.
    pub fn proceed(&self) {
        self.set(Flow::Proceed);
    }

    /// Switch the chain into error mode; only error-handling layers run until
    /// one of them proceeds.
    pub fn error(&self, err: impl Into<ChainError>) {
        self.set(Flow::Fail(err.into()));
    }

    /// End the current route's handler list and resume the parent router at
    /// the next top-level layer. Outside a route this behaves like
    /// [`Next::proceed`].
    pub fn skip_route(&self) {
        self.set(Flow::SkipRoute);
    }

    fn set(&self, flow: Flow) {
        if self.invoked.replace(true) {
            warn!("continuation invoked more than once for the same chain step; extra invocation ignored");
            return;
        }
        self.slot.set(Some(flow));
    }

    pub(crate) fn take(self) -> Option<Flow> {
        self.slot.take()
    }
}

/// A matchable, invokable unit's handler side: receives the request/response
/// pair and the continuation. Closures of the same shape implement this.
pub trait Handler: Send + Sync + 'static {
    fn handle(&self, req: &mut Request, res: &mut Response, next: &Next);
}

impl<F> Handler for F
where
    F: Fn(&mut Request, &mut Response, &Next) + Send + Sync + 'static,
{
    fn handle(&self, req: &mut Request, res: &mut Response, next: &Next) {
        self(req, res, next)
    }
}

/// Error-mode counterpart of [`Handler`]: additionally receives the in-flight
/// error. Registered separately, so the error/normal distinction is fixed at
/// registration time rather than inspected per dispatch.
pub trait ErrorHandler: Send + Sync + 'static {
    fn handle(&self, err: &ChainError, req: &mut Request, res: &mut Response, next: &Next);
}

impl<F> ErrorHandler for F
where
    F: Fn(&ChainError, &mut Request, &mut Response, &Next) + Send + Sync + 'static,
{
    fn handle(&self, err: &ChainError, req: &mut Request, res: &mut Response, next: &Next) {
        self(err, req, res, next)
    }
}

/// Hook bound to a parameter name, run before the layer that captured the
/// parameter executes. Fires at most once per request per unique value.
pub trait ParamHook: Send + Sync + 'static {
    fn handle(&self, req: &mut Request, res: &mut Response, next: &Next, value: &str);
}

impl<F> ParamHook for F
where
    F: Fn(&mut Request, &mut Response, &Next, &str) + Send + Sync + 'static,
{
    fn handle(&self, req: &mut Request, res: &mut Response, next: &Next, value: &str) {
        self(req, res, next, value)
    }
}

/// Chain mode: normal dispatch, or error dispatch carrying the error value.
#[derive(Debug)]
pub(crate) enum Mode {
    Normal,
    Error(ChainError),
}

/// How a router (or route) level of the chain finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The level exhausted its layers; control returns to the caller, which
    /// continues its own chain (or renders the terminal response).
    Continue,
    /// A handler terminated the chain by not invoking its continuation.
    Halt,
}

/// Per-request dispatch bookkeeping. Created when a request enters the
/// dispatcher, mutated only by the chain-advance loop, and discarded when the
/// response completes.
#[derive(Debug)]
pub struct DispatchState {
    pub(crate) mode: Mode,
    /// Parameter names whose hooks already fired, with the value they fired
    /// for. A hook re-fires only when a layer captures a different value.
    pub(crate) hooked_params: HashMap<String, String>,
    /// Methods collected from routes that matched the path but not the
    /// method, for the `OPTIONS`/405 collaborator.
    pub(crate) allowed_methods: Vec<Method>,
}

impl DispatchState {
    #[must_use]
    pub fn new() -> Self {
        Self {
            mode: Mode::Normal,
            hooked_params: HashMap::new(),
            allowed_methods: Vec::new(),
        }
    }

    /// Whether the chain is currently in error mode.
    #[must_use]
    pub fn in_error(&self) -> bool {
        matches!(self.mode, Mode::Error(_))
    }

    /// The in-flight error, when in error mode.
    #[must_use]
    pub fn error(&self) -> Option<&ChainError> {
        match &self.mode {
            Mode::Error(err) => Some(err),
            Mode::Normal => None,
        }
    }

    /// Method capability list collected during dispatch, usable by an
    /// `OPTIONS`/405 collaborator.
    #[must_use]
    pub fn allowed_methods(&self) -> &[Method] {
        &self.allowed_methods
    }

    pub(crate) fn record_allowed(&mut self, methods: Vec<Method>) {
        for method in methods {
            if !self.allowed_methods.contains(&method) {
                self.allowed_methods.push(method);
            }
        }
    }
}

impl Default for DispatchState {
    fn default() -> Self {
        Self::new()
    }
}
