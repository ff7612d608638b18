//! A method-indexed group of handlers bound to one path pattern.

use crate::chain::{DispatchState, ErrorHandler, Flow, Handler, Mode, Next, Outcome};
use crate::request::Request;
use crate::response::Response;
use http::Method;
use std::sync::Arc;
use tracing::debug;

enum RouteEndpoint {
    Handler(Arc<dyn Handler>),
    ErrorHandler(Arc<dyn ErrorHandler>),
}

struct RouteLayer {
    /// `None` matches every method (`all` registration).
    method: Option<Method>,
    endpoint: RouteEndpoint,
}

/// All handlers bound to one path pattern, keyed by HTTP method.
///
/// Handlers run in registration order, filtered to the request method plus
/// `all` registrations. A handler that does not invoke its continuation ends
/// the chain; `skip_route` ends only this route, resuming the parent router
/// at the next top-level layer.
pub struct Route {
    path: String,
    layers: Vec<RouteLayer>,
}

macro_rules! route_verbs {
    ($(($name:ident, $method:expr)),* $(,)?) => {
        $(
            #[doc = concat!("Register a handler for `", stringify!($name), "` requests on this route.")]
            pub fn $name<H: Handler>(&mut self, handler: H) -> &mut Self {
                self.handler(Some($method), handler)
            }
        )*
    };
}

impl Route {
    pub(crate) fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            layers: Vec::new(),
        }
    }

    /// The path string this route was registered under.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Register a handler for one method, or for every method with `None`.
    pub fn handler<H: Handler>(&mut self, method: Option<Method>, handler: H) -> &mut Self {
        self.layers.push(RouteLayer {
            method,
            endpoint: RouteEndpoint::Handler(Arc::new(handler)),
        });
        self
    }

    /// Register a handler for every method.
    pub fn all<H: Handler>(&mut self, handler: H) -> &mut Self {
        self.handler(None, handler)
    }

    /// Register an error handler scoped to this route. It runs, in
    /// registration order, when an earlier handler of this route switched
    /// the chain into error mode.
    pub fn error_handler<H: ErrorHandler>(&mut self, handler: H) -> &mut Self {
        self.layers.push(RouteLayer {
            method: None,
            endpoint: RouteEndpoint::ErrorHandler(Arc::new(handler)),
        });
        self
    }

    route_verbs! {
        (get, Method::GET),
        (post, Method::POST),
        (put, Method::PUT),
        (delete, Method::DELETE),
        (patch, Method::PATCH),
        (head, Method::HEAD),
        (options, Method::OPTIONS),
        (trace, Method::TRACE),
    }

    /// The method capability list of this route, usable by an `OPTIONS`/405
    /// collaborator. A route with a GET handler also answers HEAD.
    #[must_use]
    pub fn methods(&self) -> Vec<Method> {
        let mut methods: Vec<Method> = Vec::new();
        for layer in &self.layers {
            if let Some(method) = &layer.method {
                if !methods.contains(method) {
                    methods.push(method.clone());
                }
            }
        }
        if methods.contains(&Method::GET) && !methods.contains(&Method::HEAD) {
            methods.push(Method::HEAD);
        }
        methods
    }

    /// Whether any handler of this route would run for `method`. HEAD falls
    /// back to GET handlers when no HEAD handler is registered.
    #[must_use]
    pub fn handles_method(&self, method: &Method) -> bool {
        let head_falls_back = *method == Method::HEAD && !self.has_explicit(&Method::HEAD);
        self.layers.iter().any(|layer| match &layer.method {
            None => true,
            Some(m) => m == method || (head_falls_back && *m == Method::GET),
        })
    }

    fn has_explicit(&self, method: &Method) -> bool {
        self.layers
            .iter()
            .any(|layer| layer.method.as_ref() == Some(method))
    }

    /// Walk this route's own handler chain. Returns [`Outcome::Continue`]
    /// when the route exhausts (or a handler skipped it) and the parent
    /// router should resume its chain.
    pub(crate) fn dispatch(
        &self,
        req: &mut Request,
        res: &mut Response,
        state: &mut DispatchState,
    ) -> Outcome {
        let head_falls_back =
            *req.method() == Method::HEAD && !self.has_explicit(&Method::HEAD);

        for layer in &self.layers {
            let method_ok = match &layer.method {
                None => true,
                Some(m) => m == req.method() || (head_falls_back && *m == Method::GET),
            };
            if !method_ok {
                continue;
            }

            let next = Next::new();
            match &layer.endpoint {
                RouteEndpoint::Handler(handler) => {
                    if state.in_error() {
                        continue;
                    }
                    debug!(path = %self.path, method = %req.method(), "route handler invoked");
                    handler.handle(req, res, &next);
                }
                RouteEndpoint::ErrorHandler(handler) => {
                    let Mode::Error(err) = &state.mode else {
                        continue;
                    };
                    debug!(path = %self.path, error = %err, "route error handler invoked");
                    handler.handle(err, req, res, &next);
                }
            }

            match next.take() {
                None => return Outcome::Halt,
                Some(Flow::Proceed) => state.mode = Mode::Normal,
                Some(Flow::Fail(err)) => state.mode = Mode::Error(err),
                Some(Flow::SkipRoute) => {
                    state.mode = Mode::Normal;
                    return Outcome::Continue;
                }
            }
        }

        Outcome::Continue
    }
}
