//! Router core module - the chain-advance loop, hot path for every request.

use crate::chain::{
    ChainError, DispatchState, ErrorHandler, Flow, Handler, Mode, Next, Outcome, ParamHook,
};
use crate::pattern::{ParamVec, PathPattern, PatternOptions};
use crate::request::Request;
use crate::response::Response;
use crate::router::layer::{Endpoint, Layer};
use crate::router::route::Route;
use http::{Method, StatusCode};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Matching options a router inherits at creation and applies to every
/// pattern it compiles.
#[derive(Debug, Clone, Copy, Default)]
pub struct RouterOptions {
    pub case_sensitive: bool,
    pub strict: bool,
}

/// An ordered, mountable sequence of layers, possibly nesting other routers.
///
/// Layers are visited strictly in registration order during dispatch;
/// mounting order determines precedence. Registration takes `&mut self` and
/// dispatch takes `&self`, so the topology is immutable once serving begins.
pub struct Router {
    layers: Vec<Layer>,
    param_hooks: HashMap<String, Vec<Arc<dyn ParamHook>>>,
    options: RouterOptions,
}

macro_rules! router_verbs {
    ($(($name:ident, $method:expr)),* $(,)?) => {
        $(
            #[doc = concat!("Register a `", stringify!($name), "` handler for `path`. Shorthand for `route(path).", stringify!($name), "(handler)`.")]
            pub fn $name<H: Handler>(&mut self, path: &str, handler: H) -> &mut Self {
                self.route(path).handler(Some($method), handler);
                self
            }
        )*
    };
}

impl Router {
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(RouterOptions::default())
    }

    #[must_use]
    pub fn with_options(options: RouterOptions) -> Self {
        Self {
            layers: Vec::new(),
            param_hooks: HashMap::new(),
            options,
        }
    }

    /// Compile a pattern with this router's options, failing fast on
    /// malformed input. Registration-time patterns are programmer-supplied;
    /// a bad one is a bug, never a per-request condition.
    fn pattern_for(&self, path: &str, end: bool) -> PathPattern {
        PathPattern::compile(
            path,
            PatternOptions {
                case_sensitive: self.options.case_sensitive,
                // prefix mounts match any path beneath them, never strictly
                strict: end && self.options.strict,
                end,
            },
        )
        .unwrap_or_else(|err| panic!("invalid route pattern {path:?}: {err}"))
    }

    /// Register a handler that runs for every request reaching this router.
    pub fn middleware<H: Handler>(&mut self, handler: H) -> &mut Self {
        self.layers
            .push(Layer::new(None, Endpoint::Handler(Arc::new(handler))));
        self
    }

    /// Register a handler mounted at `prefix`: it runs for any path beginning
    /// with the prefix on a segment boundary.
    ///
    /// # Panics
    ///
    /// If `prefix` is not a valid pattern.
    pub fn middleware_at<H: Handler>(&mut self, prefix: &str, handler: H) -> &mut Self {
        let pattern = self.pattern_for(prefix, false);
        self.layers
            .push(Layer::new(Some(pattern), Endpoint::Handler(Arc::new(handler))));
        self
    }

    /// Register an error handler that runs, in registration order, while the
    /// chain is in error mode.
    pub fn error_middleware<H: ErrorHandler>(&mut self, handler: H) -> &mut Self {
        self.layers
            .push(Layer::new(None, Endpoint::ErrorHandler(Arc::new(handler))));
        self
    }

    /// Register an error handler mounted at `prefix`.
    ///
    /// # Panics
    ///
    /// If `prefix` is not a valid pattern.
    pub fn error_middleware_at<H: ErrorHandler>(&mut self, prefix: &str, handler: H) -> &mut Self {
        let pattern = self.pattern_for(prefix, false);
        self.layers.push(Layer::new(
            Some(pattern),
            Endpoint::ErrorHandler(Arc::new(handler)),
        ));
        self
    }

    /// Mount a router at `prefix`. The child only ever sees the path suffix
    /// beyond the prefix; the parent restores the full path when resuming its
    /// own chain.
    ///
    /// # Panics
    ///
    /// If `prefix` is not a valid pattern.
    pub fn mount(&mut self, prefix: &str, router: Router) -> &mut Self {
        let pattern = self.pattern_for(prefix, false);
        self.layers
            .push(Layer::new(Some(pattern), Endpoint::Router(Arc::new(router))));
        self
    }

    /// Create a route bound to `path` and return it for chained method
    /// registration.
    ///
    /// # Panics
    ///
    /// If `path` is not a valid pattern.
    pub fn route(&mut self, path: &str) -> &mut Route {
        let pattern = self.pattern_for(path, true);
        self.layers
            .push(Layer::new(Some(pattern), Endpoint::Route(Route::new(path))));
        let layer = self.layers.last_mut().expect("layer just pushed");
        match &mut layer.endpoint {
            Endpoint::Route(route) => route,
            _ => unreachable!("route layer just pushed"),
        }
    }

    router_verbs! {
        (get, Method::GET),
        (post, Method::POST),
        (put, Method::PUT),
        (delete, Method::DELETE),
        (patch, Method::PATCH),
        (head, Method::HEAD),
        (options, Method::OPTIONS),
        (trace, Method::TRACE),
    }

    /// Register a handler for every method at `path`.
    ///
    /// # Panics
    ///
    /// If `path` is not a valid pattern.
    pub fn all<H: Handler>(&mut self, path: &str, handler: H) -> &mut Self {
        self.route(path).all(handler);
        self
    }

    /// Register a hook for the named parameter. Hooks for one name run in
    /// registration order, each to completion, before the handler of the
    /// layer that captured the parameter; a hook fires at most once per
    /// request per unique captured value.
    pub fn param<H: ParamHook>(&mut self, name: &str, hook: H) -> &mut Self {
        self.param_hooks
            .entry(name.to_string())
            .or_default()
            .push(Arc::new(hook));
        self
    }

    /// Walk this router's chain for one request.
    ///
    /// Layers are taken strictly in registration order; the cursor advances
    /// eagerly before each invocation so a continuation always resumes at the
    /// right place. Returns [`Outcome::Continue`] when the chain exhausts;
    /// the caller (a parent router, or the dispatcher's terminal fallback)
    /// picks up from there with the current mode intact.
    pub fn handle(
        &self,
        req: &mut Request,
        res: &mut Response,
        state: &mut DispatchState,
    ) -> Outcome {
        let mut idx = 0;

        loop {
            let Some(layer) = self.layers.get(idx) else {
                return Outcome::Continue;
            };
            idx += 1;

            // Only error handlers run in error mode; everything else (plain
            // handlers, routes, nested routers) runs in normal mode. Errors
            // raised inside a nested router traverse that router's own error
            // layers before propagating out here.
            if layer.is_error_handler() != state.in_error() {
                continue;
            }

            let Some(matched) = layer.try_match(req.dispatch_path()) else {
                continue;
            };

            // A route that matched the path but not the method contributes
            // its capability list and is skipped.
            if let Endpoint::Route(route) = &layer.endpoint {
                if !route.handles_method(req.method()) {
                    state.record_allowed(route.methods());
                    continue;
                }
            }

            debug!(
                pattern = %layer.pattern_source(),
                path = %req.dispatch_path(),
                error_mode = state.in_error(),
                "layer matched"
            );

            // Decode captures before anything runs; a bad escape is a 400
            // and the matched layer's handler never runs.
            let mut decoded = ParamVec::new();
            let mut decode_err = None;
            for (name, raw) in &matched.params {
                match decode_param(raw) {
                    Ok(value) => decoded.push((Arc::clone(name), value)),
                    Err(err) => {
                        decode_err = Some(err);
                        break;
                    }
                }
            }
            if let Some(err) = decode_err {
                state.mode = Mode::Error(err);
                continue;
            }
            req.extend_params(&decoded);

            if let Some(outcome) = self.fire_param_hooks(&decoded, req, res, state) {
                match outcome {
                    Outcome::Halt => return Outcome::Halt,
                    // a hook errored or skipped; move to the next layer
                    Outcome::Continue => continue,
                }
            }

            match &layer.endpoint {
                Endpoint::Route(route) => {
                    if route.dispatch(req, res, state) == Outcome::Halt {
                        return Outcome::Halt;
                    }
                }
                Endpoint::Router(sub) => {
                    let outcome =
                        with_consumed(req, matched.consumed, |req| sub.handle(req, res, state));
                    if outcome == Outcome::Halt {
                        return Outcome::Halt;
                    }
                }
                // Prefix-mounted plain handlers see the suffix beyond their
                // prefix, exactly like mounted routers.
                Endpoint::Handler(handler) => {
                    let next = Next::new();
                    with_consumed(req, matched.consumed, |req| handler.handle(req, res, &next));
                    match next.take() {
                        None => return Outcome::Halt,
                        // outside a route, skip_route is a plain proceed
                        Some(Flow::Proceed) | Some(Flow::SkipRoute) => {}
                        Some(Flow::Fail(err)) => state.mode = Mode::Error(err),
                    }
                }
                Endpoint::ErrorHandler(handler) => {
                    let Mode::Error(err) = &state.mode else {
                        continue;
                    };
                    let next = Next::new();
                    with_consumed(req, matched.consumed, |req| {
                        handler.handle(err, req, res, &next);
                    });
                    match next.take() {
                        None => return Outcome::Halt,
                        Some(Flow::Proceed) | Some(Flow::SkipRoute) => {
                            state.mode = Mode::Normal;
                        }
                        Some(Flow::Fail(err)) => state.mode = Mode::Error(err),
                    }
                }
            }
        }
    }

    /// Run hooks for newly captured parameter names. Returns `None` when the
    /// owning layer's handler should run, `Some(Halt)` when a hook
    /// terminated the chain, and `Some(Continue)` when the layer must be
    /// skipped (a hook errored or asked to skip).
    fn fire_param_hooks(
        &self,
        captured: &ParamVec,
        req: &mut Request,
        res: &mut Response,
        state: &mut DispatchState,
    ) -> Option<Outcome> {
        for (name, value) in captured {
            let Some(hooks) = self.param_hooks.get(name.as_ref()) else {
                continue;
            };
            if state
                .hooked_params
                .get(name.as_ref())
                .is_some_and(|fired| fired == value)
            {
                continue;
            }
            state
                .hooked_params
                .insert(name.to_string(), value.clone());

            for hook in hooks {
                debug!(param = %name, value = %value, "param hook invoked");
                let next = Next::new();
                hook.handle(req, res, &next, value);
                match next.take() {
                    None => return Some(Outcome::Halt),
                    Some(Flow::Proceed) => {}
                    Some(Flow::Fail(err)) => {
                        state.mode = Mode::Error(err);
                        return Some(Outcome::Continue);
                    }
                    Some(Flow::SkipRoute) => return Some(Outcome::Continue),
                }
            }
        }
        None
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

/// Run `f` with the request's base path advanced past the matched prefix,
/// restoring the previous base afterwards. Consumption is clamped to the
/// path remaining at the current mount depth.
fn with_consumed<R>(
    req: &mut Request,
    consumed: usize,
    f: impl FnOnce(&mut Request) -> R,
) -> R {
    let available = req.path().len() - req.base_len();
    let saved = req.base_len();
    req.set_base_len(saved + consumed.min(available));
    let out = f(req);
    req.set_base_len(saved);
    out
}

/// Percent-decode one captured parameter value. A malformed escape is a
/// per-request 400, not a routing failure.
fn decode_param(raw: &str) -> Result<String, ChainError> {
    urlencoding::decode(raw)
        .map(|decoded| decoded.into_owned())
        .map_err(|err| {
            ChainError::with_status(
                StatusCode::BAD_REQUEST,
                anyhow::anyhow!("failed to decode param {raw:?}: {err}"),
            )
        })
}
