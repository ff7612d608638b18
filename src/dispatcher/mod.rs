//! # Dispatcher Module
//!
//! The top-level application facade that drives the dispatch chain.
//!
//! ## Overview
//!
//! [`App`] owns exactly one root router, created once at startup. For each
//! request the transport collaborator hands it a fully-parsed
//! request/response pair; the facade:
//!
//! 1. Links the request back to the shared settings store
//! 2. Seeds a fresh per-request `DispatchState`
//! 3. Drives the root router's chain to completion
//! 4. Renders the terminal fallback if nothing produced a response:
//!    a generic not-found (404) in normal mode, or a generic error response
//!    (status derived from the error value, 500 by default) in error mode
//!
//! No request is ever dropped silently: the chain either halts on a handler
//! that produced output, or the fallback attempts a terminal response.
//!
//! ## Example
//!
//! ```rust
//! use strata::{App, Method, Next, Request, Response};
//!
//! let mut app = App::new();
//! app.get("/pets/:id", |req: &mut Request, res: &mut Response, _next: &Next| {
//!     let id = req.param("id").unwrap_or("?");
//!     res.send(format!("pet {id}"));
//! });
//!
//! let mut req = Request::new(Method::GET, "/pets/42");
//! let mut res = Response::new();
//! app.handle_request(&mut req, &mut res);
//! assert_eq!(res.body_text(), "pet 42");
//! ```

mod core;

pub use core::App;
