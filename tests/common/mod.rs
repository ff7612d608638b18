#![allow(dead_code)]

use std::sync::{Arc, Mutex, Once};
use strata::{App, Method, Request, Response};

static INIT: Once = Once::new();

/// Install a test-friendly tracing subscriber, honoring `RUST_LOG`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Shared event log the test handlers append to, so ordering properties can
/// be asserted after dispatch.
pub type Trace = Arc<Mutex<Vec<String>>>;

pub fn trace() -> Trace {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn record(trace: &Trace, entry: impl Into<String>) {
    trace.lock().unwrap().push(entry.into());
}

pub fn entries(trace: &Trace) -> Vec<String> {
    trace.lock().unwrap().clone()
}

/// Run one request through the application and hand back the finished
/// response.
pub fn dispatch(app: &App, method: Method, path: &str) -> Response {
    init_tracing();
    let mut req = Request::new(method, path);
    let mut res = Response::new();
    app.handle_request(&mut req, &mut res);
    res
}
