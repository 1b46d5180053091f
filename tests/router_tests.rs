//! Router walk semantics: ordering, error-recovery scan, observer signals,
//! default headers, HEAD neutralization.

use cascade_router::{
    DispatchError, ErrorObserver, HandlerRequest, Responder, Route, Router, RouterConfig,
};
use http::Method;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

mod common;
use common::{request, responder};
use tracing_util::TestTracing;

struct CountingObserver {
    count: AtomicUsize,
    last_status: Mutex<Option<u16>>,
}

impl CountingObserver {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            count: AtomicUsize::new(0),
            last_status: Mutex::new(None),
        })
    }
}

impl ErrorObserver for CountingObserver {
    fn on_unrecoverable(&self, error: &DispatchError, _req: &HandlerRequest, _res: &Responder) {
        self.count.fetch_add(1, Ordering::SeqCst);
        *self.last_status.lock().unwrap() = Some(error.status());
    }
}

/// The documented subscriber policy: answer unrecoverable errors over HTTP.
struct RespondingObserver;

impl ErrorObserver for RespondingObserver {
    fn on_unrecoverable(&self, error: &DispatchError, _req: &HandlerRequest, res: &Responder) {
        res.send_json(
            error.status(),
            &serde_json::json!({ "error": error.to_string() }),
        );
    }
}

#[test]
fn test_zero_routes_answers_404_immediately() {
    let _tracing = TestTracing::init();
    let router = Router::new();
    let (res, rx) = responder(false);
    router.dispatch(request(Method::GET, "/anything"), res);
    assert_eq!(rx.recv().unwrap().status, 404);
}

#[test]
fn test_routes_tried_in_mount_order() {
    let order = Arc::new(Mutex::new(Vec::new()));
    let (o1, o2, o3) = (order.clone(), order.clone(), order.clone());

    let mut router = Router::new();
    router.mount(Route::new().get("/a").bind(move |_req, res, _next| {
        o1.lock().unwrap().push("a");
        res.send_status(200);
    }));
    router.mount(Route::new().get("/b").bind(move |_req, _res, next| {
        o2.lock().unwrap().push("b-first");
        next.proceed();
    }));
    router.mount(Route::new().get("/b").bind(move |_req, res, _next| {
        o3.lock().unwrap().push("b-second");
        res.send_status(200);
    }));

    let (res, rx) = responder(false);
    router.dispatch(request(Method::GET, "/b"), res);

    assert_eq!(rx.recv().unwrap().status, 200);
    assert_eq!(*order.lock().unwrap(), vec!["b-first", "b-second"]);
}

#[test]
fn test_unrecoverable_error_emitted_exactly_once() {
    // R1: normal, does not match /x. R2: purely error-handling. R3: catch-all
    // that fails. The error search runs forward from R3, so R2 never fires.
    let _tracing = TestTracing::init();
    let r2_hits = Arc::new(AtomicUsize::new(0));
    let r2_probe = r2_hits.clone();

    let observer = CountingObserver::new();
    let mut router = Router::new();
    router.subscribe_errors(observer.clone());

    router.mount(Route::new().get("/elsewhere").bind(|_req, res, _next| {
        res.send_status(200);
    }));
    router.bind_err(move |_err, _req, _res, next| {
        r2_probe.fetch_add(1, Ordering::SeqCst);
        next.proceed();
    });
    router.bind(|_req, _res, next| {
        next.fail("catch-all blew up");
    });

    let (res, rx) = responder(false);
    router.dispatch(request(Method::GET, "/x"), res);
    drop(rx);

    assert_eq!(r2_hits.load(Ordering::SeqCst), 0);
    assert_eq!(observer.count.load(Ordering::SeqCst), 1);
    assert_eq!(*observer.last_status.lock().unwrap(), Some(500));
}

#[test]
fn test_error_recovers_at_first_error_route_after_failure() {
    let mut router = Router::new();
    router.mount(Route::new().get("/x").bind(|_req, _res, next| {
        next.fail(DispatchError::with_status(503, "backend gone"));
    }));
    router.bind_err(|err, _req, res, _next| {
        let status = err.map(|e| e.status()).unwrap_or(500);
        res.send_status(status);
    });

    let (res, rx) = responder(false);
    router.dispatch(request(Method::GET, "/x"), res);
    assert_eq!(rx.recv().unwrap().status, 503);
}

#[test]
fn test_pure_error_route_skipped_for_normal_traffic() {
    let touched = Arc::new(AtomicUsize::new(0));
    let probe = touched.clone();

    let mut router = Router::new();
    router.bind_err(move |_err, _req, _res, next| {
        probe.fetch_add(1, Ordering::SeqCst);
        next.proceed();
    });
    router.bind(|_req, res, _next| {
        res.send_status(200);
    });

    let (res, rx) = responder(false);
    router.dispatch(request(Method::GET, "/any"), res);

    assert_eq!(rx.recv().unwrap().status, 200);
    assert_eq!(touched.load(Ordering::SeqCst), 0);
}

#[test]
fn test_exhausted_walk_synthesizes_not_found() {
    let _tracing = TestTracing::init();
    let observer = CountingObserver::new();
    let mut router = Router::new();
    router.subscribe_errors(observer.clone());
    router.mount(Route::new().get("/a").bind(|_req, res, _next| {
        res.send_status(200);
    }));

    let (res, rx) = responder(false);
    router.dispatch(request(Method::GET, "/zzz"), res);

    // no automatic response: every sender is dropped without a send
    assert!(rx.recv().is_err());
    assert_eq!(observer.count.load(Ordering::SeqCst), 1);
    assert_eq!(*observer.last_status.lock().unwrap(), Some(404));
}

#[test]
fn test_subscriber_answers_not_found() {
    let mut router = Router::new();
    router.subscribe_errors(Arc::new(RespondingObserver));
    router.mount(Route::new().get("/a").bind(|_req, res, _next| {
        res.send_status(200);
    }));

    let (res, rx) = responder(false);
    router.dispatch(request(Method::GET, "/missing"), res);

    let parts = rx.recv().unwrap();
    assert_eq!(parts.status, 404);
    let body: serde_json::Value = serde_json::from_slice(&parts.body).unwrap();
    assert!(body["error"].as_str().unwrap().contains("/missing"));
}

#[test]
fn test_default_headers_reach_every_response() {
    let mut default_headers = HashMap::new();
    default_headers.insert("server".to_string(), "cascade-test".to_string());
    let mut router = Router::with_config(RouterConfig {
        env: "test".to_string(),
        default_headers,
    });
    router.bind(|_req, res, _next| {
        res.send_text(200, "ok");
    });

    // the host builds each responder from the router's default headers
    let (tx, rx) = may::sync::mpsc::channel();
    let res = cascade_router::Responder::new(tx, false, router.default_headers());
    router.dispatch(request(Method::GET, "/"), res);

    let parts = rx.recv().unwrap();
    assert_eq!(parts.get_header("server"), Some("cascade-test"));
}

#[test]
fn test_head_response_mirrors_get_headers_without_body() {
    let mut router = Router::new();
    router.mount(Route::new().get("/page").bind(|_req, res, _next| {
        res.send_text(200, "<html>hello</html>");
    }));

    let (get_res, get_rx) = responder(false);
    router.dispatch(request(Method::GET, "/page"), get_res);
    let get_parts = get_rx.recv().unwrap();

    let (head_res, head_rx) = responder(true);
    router.dispatch(request(Method::HEAD, "/page"), head_res);
    let head_parts = head_rx.recv().unwrap();

    assert_eq!(head_parts.status, get_parts.status);
    assert_eq!(head_parts.headers, get_parts.headers);
    assert!(!get_parts.body.is_empty());
    assert!(head_parts.body.is_empty());
}

#[test]
fn test_transport_errors_reach_observers() {
    struct TransportObserver(AtomicUsize);

    impl ErrorObserver for TransportObserver {
        fn on_unrecoverable(&self, _e: &DispatchError, _req: &HandlerRequest, _res: &Responder) {}
        fn on_transport_error(&self, _error: &std::io::Error) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    let observer = Arc::new(TransportObserver(AtomicUsize::new(0)));
    let mut router = Router::new();
    router.subscribe_errors(observer.clone());
    router.transport_error(&std::io::Error::new(
        std::io::ErrorKind::ConnectionReset,
        "peer reset",
    ));
    assert_eq!(observer.0.load(Ordering::SeqCst), 1);
}

#[test]
fn test_settings_and_configure_blocks() {
    let mut router = Router::with_config(RouterConfig {
        env: "production".to_string(),
        default_headers: HashMap::new(),
    });
    router.set("root", "/srv/app");
    assert_eq!(router.setting("root"), Some("/srv/app"));
    assert_eq!(router.setting("missing"), None);

    let ran = Arc::new(AtomicUsize::new(0));
    let (p1, p2) = (ran.clone(), ran.clone());
    router.configure("production", move |r| {
        p1.fetch_add(1, Ordering::SeqCst);
        r.set("tuned", "yes");
    });
    router.configure("development", move |_r| {
        p2.fetch_add(100, Ordering::SeqCst);
    });

    assert_eq!(ran.load(Ordering::SeqCst), 1);
    assert_eq!(router.setting("tuned"), Some("yes"));
}
