//! # strata
//!
//! **strata** is an embeddable HTTP request-dispatch engine: given an
//! already-parsed request, it decides, in a deterministic and extensible
//! order, which registered handlers get a chance to process it, extracts
//! path parameters, and passes control between handlers, mounted
//! sub-routers, and error handlers through an explicit continuation.
//!
//! ## Architecture
//!
//! The library is organized into several key modules:
//!
//! - **[`pattern`]** - Route pattern compilation and path matching with
//!   parameter capture, backed by compiled regexes
//! - **[`router`]** - Ordered, mountable layer chains: routes, middleware,
//!   nested routers, and the chain-advance loop
//! - **[`chain`]** - The continuation primitive ([`Next`]), the chain error
//!   value ([`ChainError`]), and per-request dispatch state
//! - **[`dispatcher`]** - The application facade ([`App`]) owning the root
//!   router and the terminal not-found/error fallback
//! - **[`request`]** / **[`response`]** - The minimal request/response
//!   abstraction the engine dispatches on; transports construct the pair
//! - **[`settings`]** - The startup-configured key/value store shared with
//!   handlers
//!
//! ## Control flow
//!
//! Dispatch is a cooperative state machine driven entirely by explicit
//! continuation invocation. Each matching layer's handler receives the
//! request/response pair and a [`Next`]; calling `next.proceed()` advances
//! the chain, `next.error(..)` switches it into error mode (only error
//! handlers run until one proceeds), and `next.skip_route()` abandons the
//! current route's remaining handlers. Not invoking the continuation
//! terminates the chain: the handler produced the response.
//!
//! A request that exhausts the chain in normal mode gets a default 404; one
//! that exhausts it in error mode gets an error response with the status
//! carried by the error value (500 by default).
//!
//! ## Quick Start
//!
//! ```rust
//! use strata::{App, Method, Next, Request, Response, Router};
//!
//! let mut app = App::new();
//!
//! // middleware runs for every request, in registration order
//! app.middleware(|_req: &mut Request, res: &mut Response, next: &Next| {
//!     res.set_header("x-engine", "strata".to_string());
//!     next.proceed();
//! });
//!
//! // routes capture parameters
//! app.get("/pets/:id", |req: &mut Request, res: &mut Response, _next: &Next| {
//!     let id = req.param("id").unwrap_or("?");
//!     res.send(format!("pet {id}"));
//! });
//!
//! // routers mount at a prefix and only see the suffix beyond it
//! let mut api = Router::new();
//! api.get("/status", |_req: &mut Request, res: &mut Response, _next: &Next| {
//!     res.send("ok");
//! });
//! app.mount("/api", api);
//!
//! let mut req = Request::new(Method::GET, "/pets/42");
//! let mut res = Response::new();
//! app.handle_request(&mut req, &mut res);
//! assert_eq!(res.body_text(), "pet 42");
//! ```
//!
//! ## Concurrency model
//!
//! One logical thread of control per request: the chain does nothing until
//! the current handler invokes its continuation, and requests are dispatched
//! independently with no shared per-request state. The router topology is
//! immutable once serving begins (registration takes `&mut self`, dispatch
//! takes `&self`), so an `App` can be shared freely across threads or
//! coroutines.
//!
//! ## Error handling
//!
//! Handler-raised errors travel the chain as [`ChainError`] values (any
//! `anyhow::Error`, optionally tagged with a status). Malformed route
//! patterns are programmer errors and fail fast at registration with a
//! [`PatternError`]; they never degrade dispatch per request.

pub mod chain;
pub mod dispatcher;
pub mod pattern;
pub mod request;
pub mod response;
pub mod router;
pub mod settings;

pub use chain::{ChainError, DispatchState, ErrorHandler, Handler, Next, Outcome, ParamHook};
pub use dispatcher::App;
pub use http::{Method, StatusCode};
pub use pattern::{ParamVec, PathMatch, PathPattern, PatternError, PatternOptions};
pub use request::Request;
pub use response::{HeaderVec, Response};
pub use router::{Route, Router, RouterOptions};
pub use settings::{SettingsStore, CASE_SENSITIVE_ROUTING, STRICT_ROUTING};
