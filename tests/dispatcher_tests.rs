mod common;

use common::{dispatch, entries, record, trace};
use strata::{App, ChainError, Method, Next, Request, Response, Router, StatusCode};

#[test]
fn test_error_reaches_error_handler() {
    let log = trace();
    let mut app = App::new();
    app.get(
        "/boom",
        |_req: &mut Request, _res: &mut Response, next: &Next| next.error("boom"),
    );
    {
        let log = log.clone();
        app.error_middleware(
            move |err: &ChainError, _req: &mut Request, res: &mut Response, _next: &Next| {
                record(&log, format!("err={err}"));
                res.set_status(StatusCode::INTERNAL_SERVER_ERROR);
                res.send("handled");
            },
        );
    }

    let res = dispatch(&app, Method::GET, "/boom");
    assert_eq!(entries(&log), vec!["err=boom"]);
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.body_text(), "handled");
}

#[test]
fn test_error_mode_skips_normal_layers_until_cleared() {
    let log = trace();
    let mut app = App::new();
    app.middleware(|_req: &mut Request, _res: &mut Response, next: &Next| next.error("kaput"));
    {
        let log = log.clone();
        app.middleware(move |_req: &mut Request, _res: &mut Response, next: &Next| {
            record(&log, "skipped");
            next.proceed();
        });
    }
    {
        let log = log.clone();
        app.error_middleware(
            move |_err: &ChainError, _req: &mut Request, _res: &mut Response, next: &Next| {
                record(&log, "error handler");
                next.proceed();
            },
        );
    }
    {
        let log = log.clone();
        app.middleware(move |_req: &mut Request, _res: &mut Response, next: &Next| {
            record(&log, "resumed");
            next.proceed();
        });
    }

    let res = dispatch(&app, Method::GET, "/");
    // the normal layer between the error and the error handler never ran;
    // proceeding from the error handler restored normal dispatch
    assert_eq!(entries(&log), vec!["error handler", "resumed"]);
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[test]
fn test_unhandled_error_uses_carried_status() {
    let mut app = App::new();
    app.get(
        "/teapot",
        |_req: &mut Request, _res: &mut Response, next: &Next| {
            next.error(ChainError::status_msg(
                StatusCode::IM_A_TEAPOT,
                "short and stout",
            ));
        },
    );

    let res = dispatch(&app, Method::GET, "/teapot");
    assert_eq!(res.status(), StatusCode::IM_A_TEAPOT);
    assert_eq!(res.body_text(), "I'm a teapot");
}

#[test]
fn test_unhandled_error_defaults_to_500() {
    let mut app = App::new();
    app.get(
        "/boom",
        |_req: &mut Request, _res: &mut Response, next: &Next| next.error("no status attached"),
    );

    let res = dispatch(&app, Method::GET, "/boom");
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.body_text(), "Internal Server Error");
}

#[test]
fn test_route_error_handler_catches_route_errors() {
    let mut app = App::new();
    let route = app.route("/scoped");
    route.get(|_req: &mut Request, _res: &mut Response, next: &Next| next.error("inner"));
    route.error_handler(
        |err: &ChainError, _req: &mut Request, res: &mut Response, _next: &Next| {
            res.send(format!("caught {err}"));
        },
    );

    let res = dispatch(&app, Method::GET, "/scoped");
    assert_eq!(res.body_text(), "caught inner");
}

#[test]
fn test_prefix_scoped_error_handler_only_covers_its_prefix() {
    let log = trace();
    let mut app = App::new();
    app.get(
        "/api/fail",
        |_req: &mut Request, _res: &mut Response, next: &Next| next.error("api down"),
    );
    app.get(
        "/fail",
        |_req: &mut Request, _res: &mut Response, next: &Next| next.error("root down"),
    );
    {
        let log = log.clone();
        app.error_middleware_at(
            "/api",
            move |err: &ChainError, _req: &mut Request, res: &mut Response, _next: &Next| {
                record(&log, format!("api:{err}"));
                res.set_status(StatusCode::BAD_GATEWAY);
                res.send("api error");
            },
        );
    }

    let res = dispatch(&app, Method::GET, "/api/fail");
    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(res.body_text(), "api error");

    // an error raised outside the prefix never reaches the scoped handler
    let res = dispatch(&app, Method::GET, "/fail");
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.body_text(), "Internal Server Error");
    assert_eq!(entries(&log), vec!["api:api down"]);
}

#[test]
fn test_sub_router_errors_propagate_to_parent() {
    let mut sub = Router::new();
    sub.get(
        "/fail",
        |_req: &mut Request, _res: &mut Response, next: &Next| next.error("sub fail"),
    );
    let mut app = App::new();
    app.mount("/s", sub);
    app.error_middleware(
        |err: &ChainError, _req: &mut Request, res: &mut Response, _next: &Next| {
            res.set_status(StatusCode::INTERNAL_SERVER_ERROR);
            res.send(format!("outer {err}"));
        },
    );

    let res = dispatch(&app, Method::GET, "/s/fail");
    assert_eq!(res.body_text(), "outer sub fail");
}

#[test]
fn test_error_raised_before_mount_skips_sub_router() {
    let log = trace();
    let mut app = App::new();
    app.middleware(|_req: &mut Request, _res: &mut Response, next: &Next| next.error("early"));
    let mut sub = Router::new();
    {
        let log = log.clone();
        sub.error_middleware(
            move |_err: &ChainError, _req: &mut Request, _res: &mut Response, next: &Next| {
                record(&log, "sub error handler");
                next.proceed();
            },
        );
    }
    app.mount("/s", sub);
    {
        let log = log.clone();
        app.error_middleware(
            move |_err: &ChainError, _req: &mut Request, res: &mut Response, _next: &Next| {
                record(&log, "outer error handler");
                res.send("done");
            },
        );
    }

    let res = dispatch(&app, Method::GET, "/s/anything");
    // router layers are skipped entirely in error mode; only the parent's
    // error handler sees the error
    assert_eq!(entries(&log), vec!["outer error handler"]);
    assert_eq!(res.body_text(), "done");
}

#[test]
fn test_options_lists_allowed_methods() {
    let mut app = App::new();
    app.get(
        "/pets",
        |_req: &mut Request, res: &mut Response, _next: &Next| res.send("pets"),
    );
    app.post(
        "/pets",
        |_req: &mut Request, res: &mut Response, _next: &Next| res.send("created"),
    );

    // each registration is its own route: the first contributes GET plus the
    // implied HEAD, the second contributes POST
    let res = dispatch(&app, Method::OPTIONS, "/pets");
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.get_header("Allow"), Some("GET, HEAD, POST"));
    assert_eq!(res.body_text(), "GET, HEAD, POST");
}

#[test]
fn test_head_falls_back_to_get_handler() {
    let mut app = App::new();
    app.get(
        "/pets",
        |_req: &mut Request, res: &mut Response, _next: &Next| res.send("pets"),
    );

    let res = dispatch(&app, Method::HEAD, "/pets");
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.body_text(), "pets");
}

#[test]
fn test_unmatched_method_gets_not_found() {
    let mut app = App::new();
    app.get(
        "/pets",
        |_req: &mut Request, res: &mut Response, _next: &Next| res.send("pets"),
    );

    let res = dispatch(&app, Method::POST, "/pets");
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.body_text(), "Cannot POST /pets");
}

#[test]
fn test_handler_without_continuation_halts_chain() {
    let log = trace();
    let mut app = App::new();
    app.get(
        "/done",
        |_req: &mut Request, res: &mut Response, _next: &Next| res.send("done"),
    );
    {
        let log = log.clone();
        app.middleware(move |_req: &mut Request, _res: &mut Response, next: &Next| {
            record(&log, "never");
            next.proceed();
        });
    }

    let res = dispatch(&app, Method::GET, "/done");
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.body_text(), "done");
    // the chain stopped at the responding handler
    assert!(entries(&log).is_empty());
}

#[test]
fn test_duplicate_continuation_invocation_is_ignored() {
    let log = trace();
    let mut app = App::new();
    app.middleware(|_req: &mut Request, _res: &mut Response, next: &Next| {
        next.proceed();
        next.proceed();
    });
    {
        let log = log.clone();
        app.middleware(move |_req: &mut Request, res: &mut Response, next: &Next| {
            record(&log, "downstream");
            res.send("once");
            next.proceed();
        });
    }

    let res = dispatch(&app, Method::GET, "/");
    assert_eq!(entries(&log), vec!["downstream"]);
    assert_eq!(res.body_text(), "once");
}

#[test]
fn test_fallback_never_overwrites_sent_response() {
    let mut app = App::new();
    app.get(
        "/leaky",
        |_req: &mut Request, res: &mut Response, next: &Next| {
            res.send("leaky");
            next.proceed();
        },
    );

    // the chain exhausted, but the handler's output stands
    let res = dispatch(&app, Method::GET, "/leaky");
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.body_text(), "leaky");
}
