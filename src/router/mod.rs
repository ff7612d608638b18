//! # Router Module
//!
//! Ordered, mountable dispatch chains: the layer sequence, the route
//! builder, and the chain-advance loop that walks them per request.
//!
//! ## Overview
//!
//! A [`Router`] is an ordered list of layers, each pairing a compiled path
//! pattern (or "match everything") with an endpoint: a plain handler, an
//! error handler, a [`Route`], or another mounted `Router`. Dispatch walks
//! the list strictly in registration order, matches each layer against the
//! path remaining after the router's mount prefix, and hands matching
//! endpoints the request together with a continuation.
//!
//! ## Control flow
//!
//! The chain is cooperative: nothing advances until the current handler
//! invokes its continuation. `proceed` resumes the walk, `error` switches
//! the chain into error mode (only error-handling layers run until one
//! proceeds), and `skip_route` abandons the current route's remaining
//! handlers only. A handler that never invokes the continuation terminates
//! the chain.
//!
//! ## Example
//!
//! ```rust
//! use strata::{Next, Request, Response, Router};
//!
//! let mut router = Router::new();
//! router.get("/pets/:id", |req: &mut Request, res: &mut Response, _next: &Next| {
//!     let id = req.param("id").unwrap_or("?");
//!     res.send(format!("pet {id}"));
//! });
//! ```

mod core;
mod layer;
mod route;

pub use core::{Router, RouterOptions};
pub use route::Route;
