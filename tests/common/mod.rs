#![allow(dead_code)]

use cascade_router::{HandlerRequest, Responder, ResponseParts};
use http::Method;
use may::sync::mpsc;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Once;

static MAY_INIT: Once = Once::new();

/// Configure the may coroutine runtime once per test binary.
pub fn setup_may_runtime() {
    MAY_INIT.call_once(|| {
        may::config().set_stack_size(0x8000);
    });
}

/// A request with no headers, query or body.
pub fn request(method: Method, path: &str) -> Arc<HandlerRequest> {
    Arc::new(HandlerRequest::new(method, path))
}

/// A responder wired to a fresh reply channel with no default headers.
pub fn responder(head: bool) -> (Responder, mpsc::Receiver<ResponseParts>) {
    let (tx, rx) = mpsc::channel();
    (Responder::new(tx, head, Arc::new(HashMap::new())), rx)
}
