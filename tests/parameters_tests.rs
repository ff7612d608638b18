mod common;

use common::{dispatch, entries, record, trace};
use strata::{App, ChainError, Method, Next, Request, Response, Router, StatusCode};

#[test]
fn test_params_captured_per_method() {
    let mut app = App::new();
    app.get(
        "/users/:id",
        |req: &mut Request, res: &mut Response, _next: &Next| {
            res.send(format!("user {}", req.param("id").unwrap_or("?")));
        },
    );

    let res = dispatch(&app, Method::GET, "/users/42");
    assert_eq!(res.body_text(), "user 42");

    // same path, different method: the route does not answer
    let res = dispatch(&app, Method::POST, "/users/42");
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[test]
fn test_param_hooks_run_in_order_before_handler() {
    let log = trace();
    let mut app = App::new();
    {
        let log = log.clone();
        app.param(
            "id",
            move |_req: &mut Request, _res: &mut Response, next: &Next, value: &str| {
                record(&log, format!("p1:{value}"));
                next.proceed();
            },
        );
    }
    {
        let log = log.clone();
        app.param(
            "id",
            move |_req: &mut Request, _res: &mut Response, next: &Next, value: &str| {
                record(&log, format!("p2:{value}"));
                next.proceed();
            },
        );
    }
    {
        let log = log.clone();
        app.get(
            "/users/:id",
            move |req: &mut Request, res: &mut Response, _next: &Next| {
                record(&log, format!("h:{}", req.param("id").unwrap_or("?")));
                res.send("ok");
            },
        );
    }

    dispatch(&app, Method::GET, "/users/7");
    assert_eq!(entries(&log), vec!["p1:7", "p2:7", "h:7"]);
}

#[test]
fn test_param_hook_fires_once_per_request_per_value() {
    let log = trace();
    let mut app = App::new();
    {
        let log = log.clone();
        app.param(
            "id",
            move |_req: &mut Request, _res: &mut Response, next: &Next, value: &str| {
                record(&log, format!("hook:{value}"));
                next.proceed();
            },
        );
    }
    {
        let log = log.clone();
        app.get(
            "/u/:id",
            move |_req: &mut Request, _res: &mut Response, next: &Next| {
                record(&log, "h1");
                next.proceed();
            },
        );
    }
    {
        let log = log.clone();
        app.get(
            "/u/:id",
            move |_req: &mut Request, res: &mut Response, _next: &Next| {
                record(&log, "h2");
                res.send("ok");
            },
        );
    }

    dispatch(&app, Method::GET, "/u/9");
    // two layers captured the same value; the hook fired only for the first
    assert_eq!(entries(&log), vec!["hook:9", "h1", "h2"]);

    // the fired set is per request, so a new request fires the hook again
    log.lock().unwrap().clear();
    dispatch(&app, Method::GET, "/u/9");
    assert_eq!(entries(&log), vec!["hook:9", "h1", "h2"]);
}

#[test]
fn test_param_hook_refires_for_new_value() {
    let log = trace();
    let mut app = App::new();
    {
        let log = log.clone();
        app.param(
            "id",
            move |_req: &mut Request, _res: &mut Response, next: &Next, value: &str| {
                record(&log, format!("hook:{value}"));
                next.proceed();
            },
        );
    }
    {
        let log = log.clone();
        app.middleware_at(
            "/org/:id",
            move |req: &mut Request, _res: &mut Response, next: &Next| {
                record(&log, format!("m:{}", req.param("id").unwrap_or("?")));
                next.proceed();
            },
        );
    }
    {
        let log = log.clone();
        app.get(
            "/org/:x/team/:id",
            move |req: &mut Request, res: &mut Response, _next: &Next| {
                record(&log, format!("h:{}", req.param("id").unwrap_or("?")));
                res.send("ok");
            },
        );
    }

    dispatch(&app, Method::GET, "/org/1/team/2");
    // the second layer captured a different value for the same name, so the
    // hook fired again; same-value captures stay suppressed
    assert_eq!(entries(&log), vec!["hook:1", "m:1", "hook:2", "h:2"]);
}

#[test]
fn test_param_hook_error_skips_owning_layer() {
    let log = trace();
    let mut app = App::new();
    app.param(
        "id",
        |_req: &mut Request, _res: &mut Response, next: &Next, _value: &str| {
            next.error("bad id");
        },
    );
    {
        let log = log.clone();
        app.get(
            "/users/:id",
            move |_req: &mut Request, res: &mut Response, _next: &Next| {
                record(&log, "handler");
                res.send("ok");
            },
        );
    }
    app.error_middleware(
        |err: &ChainError, _req: &mut Request, res: &mut Response, _next: &Next| {
            res.set_status(StatusCode::INTERNAL_SERVER_ERROR);
            res.send(format!("{err}"));
        },
    );

    let res = dispatch(&app, Method::GET, "/users/13");
    // the capturing layer's handler never ran; the error traveled on
    assert!(entries(&log).is_empty());
    assert_eq!(res.body_text(), "bad id");
}

#[test]
fn test_params_percent_decoded() {
    let mut app = App::new();
    app.get(
        "/files/:name",
        |req: &mut Request, res: &mut Response, _next: &Next| {
            res.send(req.param("name").unwrap_or("?").to_string());
        },
    );

    let res = dispatch(&app, Method::GET, "/files/hello%20world");
    assert_eq!(res.body_text(), "hello world");
}

#[test]
fn test_undecodable_param_is_bad_request() {
    let mut app = App::new();
    app.get(
        "/files/:name",
        |_req: &mut Request, res: &mut Response, _next: &Next| {
            res.send("never");
        },
    );

    // %FF is not valid UTF-8 once decoded
    let res = dispatch(&app, Method::GET, "/files/%FF");
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(res.body_text(), "Bad Request");
}

#[test]
fn test_wildcard_captured_under_positional_key() {
    let mut app = App::new();
    app.get(
        "/assets/*",
        |req: &mut Request, res: &mut Response, _next: &Next| {
            res.send(req.param("0").unwrap_or("?").to_string());
        },
    );

    let res = dispatch(&app, Method::GET, "/assets/css/site.css");
    assert_eq!(res.body_text(), "css/site.css");
}

#[test]
fn test_optional_param_matches_with_and_without() {
    let mut app = App::new();
    app.get(
        "/files/:name?",
        |req: &mut Request, res: &mut Response, _next: &Next| {
            res.send(req.param("name").unwrap_or("none").to_string());
        },
    );

    assert_eq!(dispatch(&app, Method::GET, "/files/report").body_text(), "report");
    assert_eq!(dispatch(&app, Method::GET, "/files").body_text(), "none");
}

#[test]
fn test_innermost_capture_wins_for_shadowed_names() {
    let mut sub = Router::new();
    sub.get(
        "/team/:id",
        |req: &mut Request, res: &mut Response, _next: &Next| {
            res.send(req.param("id").unwrap_or("?").to_string());
        },
    );
    let mut app = App::new();
    app.mount("/org/:id", sub);

    let res = dispatch(&app, Method::GET, "/org/1/team/2");
    assert_eq!(res.body_text(), "2");
}
