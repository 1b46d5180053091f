//! The layer chain and its continuation.
//!
//! Every matched route drives its request through an ordered list of
//! [`Layer`]s. A layer receives the request, the responder and a mutable
//! [`Next`]; it either terminates the request through the responder, calls
//! [`Next::proceed`] to hand the request to the next layer, or calls
//! [`Next::fail`] to switch the chain into error-recovery mode. While an
//! error is in flight, normal layers are skipped — only an error-handling
//! layer can observe it, and it consumes the error by calling `proceed`.
//!
//! A layer is classified at registration time by the call that bound it
//! (`bind` vs `bind_err`), never by inspecting the function itself.

use super::core::Route;
use super::matcher::CaptureVec;
use crate::error::DispatchError;
use crate::request::HandlerRequest;
use crate::response::Responder;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, warn};

/// A processing layer invoked during normal dispatch.
pub type NormalFn = Arc<dyn Fn(&HandlerRequest, &Responder, &mut Next<'_>) + Send + Sync>;

/// An error-handling layer. The error slot is `None` when the chain reaches
/// the layer without a failure in flight.
pub type ErrorFn =
    Arc<dyn Fn(Option<DispatchError>, &HandlerRequest, &Responder, &mut Next<'_>) + Send + Sync>;

/// A chain entry: either a normal processing layer or an error handler.
#[derive(Clone)]
pub enum Layer {
    Normal(NormalFn),
    Error(ErrorFn),
}

impl Layer {
    #[must_use]
    pub fn is_error_layer(&self) -> bool {
        matches!(self, Layer::Error(_))
    }
}

/// Continuation handed to a route by its caller. Invoked at most once, with
/// the error (if any) the route could not recover.
pub type Callback<'a> = Box<dyn FnOnce(Option<DispatchError>) + 'a>;

/// The advancing continuation bound to one request passing through one
/// route's chain.
///
/// Created fresh for every `handle` call and discarded when the chain
/// finishes. Carries the match captures of the winning pattern and a cursor
/// into the layer list; the outer callback (the router's continuation) is
/// consumed when the chain runs out or forwards an unrecoverable error.
pub struct Next<'a> {
    route: &'a Route,
    request: &'a Arc<HandlerRequest>,
    responder: &'a Responder,
    captures: Option<CaptureVec>,
    cursor: usize,
    callback: Option<Callback<'a>>,
}

impl<'a> Next<'a> {
    pub(crate) fn new(
        route: &'a Route,
        request: &'a Arc<HandlerRequest>,
        responder: &'a Responder,
        captures: Option<CaptureVec>,
        cursor: usize,
        callback: Option<Callback<'a>>,
    ) -> Self {
        Self {
            route,
            request,
            responder,
            captures,
            cursor,
            callback,
        }
    }

    /// Advance to the next layer (or out of the route) with no error.
    pub fn proceed(&mut self) {
        self.advance(None);
    }

    /// Advance in error-recovery mode: normal layers are skipped until an
    /// error-handling layer consumes `err`, or the route forwards it out.
    pub fn fail(&mut self, err: impl Into<DispatchError>) {
        self.advance(Some(err.into()));
    }

    /// Capture groups of the pattern that matched this route, if any.
    #[must_use]
    pub fn captures(&self) -> Option<&CaptureVec> {
        self.captures.as_ref()
    }

    /// The `idx`-th capture group of the winning pattern.
    #[must_use]
    pub fn capture(&self, idx: usize) -> Option<&str> {
        self.captures.as_ref()?.get(idx)?.as_deref()
    }

    /// Core advance algorithm.
    ///
    /// A route that is not an error handler forwards an in-flight error to
    /// its caller untouched. Otherwise the cursor walks the layer list:
    /// error layers always run (receiving the error slot), normal layers run
    /// only when no error is in flight and are skipped — not invoked —
    /// otherwise. A panic inside a layer re-enters here as an error.
    pub(crate) fn advance(&mut self, mut error: Option<DispatchError>) {
        if error.is_some() && !self.route.is_error_handler() {
            self.finish(error);
            return;
        }

        let route = self.route;
        let request = self.request;
        let responder = self.responder;

        loop {
            let Some(layer) = route.layer(self.cursor) else {
                self.finish(error);
                return;
            };
            self.cursor += 1;

            match layer {
                Layer::Error(f) => {
                    let err = error.take();
                    let outcome =
                        catch_unwind(AssertUnwindSafe(|| f(err, request, responder, &mut *self)));
                    if let Err(payload) = outcome {
                        self.advance(Some(DispatchError::from_panic(payload)));
                    }
                    return;
                }
                Layer::Normal(f) => {
                    if error.is_some() {
                        debug!(
                            request_id = %request.request_id,
                            cursor = self.cursor,
                            "normal layer skipped while error in flight"
                        );
                        continue;
                    }
                    let outcome =
                        catch_unwind(AssertUnwindSafe(|| f(request, responder, &mut *self)));
                    if let Err(payload) = outcome {
                        self.advance(Some(DispatchError::from_panic(payload)));
                    }
                    return;
                }
            }
        }
    }

    fn finish(&mut self, error: Option<DispatchError>) {
        match self.callback.take() {
            Some(callback) => callback(error),
            None => {
                // Detached (parallel) chains have nowhere to forward to.
                if let Some(err) = error {
                    warn!(
                        request_id = %self.request.request_id,
                        error = %err,
                        "error at end of detached chain dropped"
                    );
                }
            }
        }
    }
}
