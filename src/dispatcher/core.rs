//! Dispatcher core module - the application facade and terminal fallback.

use crate::chain::{DispatchState, ErrorHandler, Handler, Mode, Outcome, ParamHook};
use crate::request::Request;
use crate::response::Response;
use crate::router::{Route, Router, RouterOptions};
use crate::settings::{SettingsStore, CASE_SENSITIVE_ROUTING, STRICT_ROUTING};
use http::{Method, StatusCode};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// The top-level entry point: owns one root [`Router`] and the shared
/// settings store, seeds per-request dispatch state, and drives the chain to
/// completion, finally rendering a default not-found or error response when
/// no layer produced one.
///
/// Registration delegates to the root router; the transport collaborator
/// calls [`App::handle_request`] once per fully-parsed request/response pair.
pub struct App {
    router: Router,
    settings: Arc<SettingsStore>,
}

macro_rules! app_verbs {
    ($(($name:ident, $method:expr)),* $(,)?) => {
        $(
            #[doc = concat!("Register a `", stringify!($name), "` handler for `path` on the root router.")]
            pub fn $name<H: Handler>(&mut self, path: &str, handler: H) -> &mut Self {
                self.router.$name(path, handler);
                self
            }
        )*
    };
}

impl App {
    /// Create an application with default settings (case-insensitive,
    /// non-strict routing).
    #[must_use]
    pub fn new() -> Self {
        Self::with_settings(SettingsStore::new())
    }

    /// Create an application from a configured settings store. The routing
    /// options (`"case sensitive routing"`, `"strict routing"`) are read here,
    /// at root-router creation time; changing them afterwards has no effect
    /// on already-compiled patterns.
    #[must_use]
    pub fn with_settings(settings: SettingsStore) -> Self {
        let options = RouterOptions {
            case_sensitive: settings.enabled(CASE_SENSITIVE_ROUTING),
            strict: settings.enabled(STRICT_ROUTING),
        };
        info!(
            case_sensitive = options.case_sensitive,
            strict = options.strict,
            "application created"
        );
        Self {
            router: Router::with_options(options),
            settings: Arc::new(settings),
        }
    }

    /// The application's settings store.
    #[must_use]
    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    /// The root router, for registration forms the facade does not forward.
    pub fn router_mut(&mut self) -> &mut Router {
        &mut self.router
    }

    /// Register a handler that runs for every request.
    pub fn middleware<H: Handler>(&mut self, handler: H) -> &mut Self {
        self.router.middleware(handler);
        self
    }

    /// Register a handler mounted at `prefix`.
    pub fn middleware_at<H: Handler>(&mut self, prefix: &str, handler: H) -> &mut Self {
        self.router.middleware_at(prefix, handler);
        self
    }

    /// Register an error handler.
    pub fn error_middleware<H: ErrorHandler>(&mut self, handler: H) -> &mut Self {
        self.router.error_middleware(handler);
        self
    }

    /// Register an error handler mounted at `prefix`.
    pub fn error_middleware_at<H: ErrorHandler>(&mut self, prefix: &str, handler: H) -> &mut Self {
        self.router.error_middleware_at(prefix, handler);
        self
    }

    /// Mount a router at `prefix` on the root router.
    pub fn mount(&mut self, prefix: &str, router: Router) -> &mut Self {
        self.router.mount(prefix, router);
        self
    }

    /// Create a route on the root router and return it for chained method
    /// registration.
    pub fn route(&mut self, path: &str) -> &mut Route {
        self.router.route(path)
    }

    /// Register a parameter hook on the root router.
    pub fn param<H: ParamHook>(&mut self, name: &str, hook: H) -> &mut Self {
        self.router.param(name, hook);
        self
    }

    app_verbs! {
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
    pub fn all<H: Handler>(&mut self, path: &str, handler: H) -> &mut Self {
        self.router.all(path, handler);
        self
    }

    /// Drive the root router's chain for one request, then render the
    /// terminal fallback if the chain exhausted without a response:
    /// a 404 (`Cannot GET /path`) in normal mode, an automatic `OPTIONS`
    /// reply when the path exists under other methods, or an error response
    /// with the status carried by the unconsumed error.
    pub fn handle_request(&self, req: &mut Request, res: &mut Response) {
        req.bind_app(Arc::clone(&self.settings));
        let mut state = DispatchState::new();

        debug!(method = %req.method(), path = %req.path(), "dispatch start");

        match self.router.handle(req, res, &mut state) {
            Outcome::Halt => {
                if res.sent() {
                    info!(
                        method = %req.method(),
                        path = %req.path(),
                        status = res.status().as_u16(),
                        "request handled"
                    );
                } else {
                    warn!(
                        method = %req.method(),
                        path = %req.path(),
                        "chain halted without a response; handler neither sent output nor invoked its continuation"
                    );
                }
            }
            Outcome::Continue => self.finalize(req, res, state),
        }
    }

    /// Terminal fallback for an exhausted chain.
    fn finalize(&self, req: &Request, res: &mut Response, state: DispatchState) {
        let DispatchState {
            mode,
            allowed_methods,
            ..
        } = state;

        if res.sent() {
            // a handler wrote the response but still continued the chain
            debug!(
                method = %req.method(),
                path = %req.path(),
                "chain exhausted after response was sent"
            );
            return;
        }

        match mode {
            Mode::Error(err) => {
                let status = err.status();
                error!(
                    method = %req.method(),
                    path = %req.path(),
                    status = status.as_u16(),
                    error = %err,
                    "unhandled chain error"
                );
                res.send_status(status);
            }
            Mode::Normal => {
                if *req.method() == Method::OPTIONS && !allowed_methods.is_empty() {
                    let allow = allowed_methods
                        .iter()
                        .map(Method::as_str)
                        .collect::<Vec<_>>()
                        .join(", ");
                    res.set_header("Allow", allow.clone());
                    res.set_status(StatusCode::OK);
                    res.send(allow);
                } else {
                    warn!(
                        method = %req.method(),
                        path = %req.path(),
                        "no layer handled the request"
                    );
                    res.set_status(StatusCode::NOT_FOUND);
                    res.send(format!("Cannot {} {}", req.method(), req.path()));
                }
            }
        }
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}
