use super::chain::{Callback, ErrorFn, Layer, Next, NormalFn};
use super::matcher::{match_request, CaptureVec, MatchResult, MatchTable, PatternSpec};
use crate::error::DispatchError;
use crate::request::HandlerRequest;
use crate::response::Responder;
use crate::runtime_config::RuntimeConfig;
use http::Method;
use may::coroutine;
use std::sync::Arc;
use tracing::error;

/// Replacement for table-based matching, installed with [`Route::matcher`].
pub type CustomMatcher = Arc<dyn Fn(&HandlerRequest) -> MatchResult + Send + Sync>;

/// One entry in the router's dispatch order: a pattern table (or catch-all /
/// custom matcher) plus the layer chain that runs on a match.
///
/// Routes are built by value during setup and are immutable once mounted:
///
/// ```rust,ignore
/// router.mount(
///     Route::new()
///         .get("/pets")
///         .get(PatternSpec::regex(r"^/pets/(\d+)$"))
///         .bind(|req, res, next| {
///             let id = next.capture(0).map(str::to_owned);
///             match id {
///                 Some(id) => res.send_json(200, &serde_json::json!({ "id": id })),
///                 None => res.send_json(200, &serde_json::json!({ "pets": [] })),
///             }
///         }),
/// );
/// ```
///
/// A route holding at least one error layer (bound via
/// [`bind_err`](Route::bind_err)) is an *error-handling route* and is a
/// valid target for the router's error-recovery scan. When it holds nothing
/// but error layers, the router additionally skips it during normal
/// dispatch, so such routes only ever see failures.
pub struct Route {
    parallel: bool,
    catch_all: bool,
    error_handler: bool,
    table: MatchTable,
    custom: Option<CustomMatcher>,
    layers: Vec<Layer>,
}

impl Route {
    /// An empty route; add patterns and layers before mounting.
    #[must_use]
    pub fn new() -> Self {
        Self {
            parallel: false,
            catch_all: false,
            error_handler: false,
            table: MatchTable::default(),
            custom: None,
            layers: Vec::new(),
        }
    }

    /// A route whose chain runs detached: the router's continuation is
    /// invoked immediately and the chain completes on its own coroutine.
    #[must_use]
    pub fn parallel() -> Self {
        let mut route = Self::new();
        route.parallel = true;
        route
    }

    /// A route that matches every request unconditionally.
    #[must_use]
    pub fn catch_all() -> Self {
        let mut route = Self::new();
        route.catch_all = true;
        route
    }

    /// Install a matcher that replaces table-based matching entirely.
    #[must_use]
    pub fn matcher(
        mut self,
        f: impl Fn(&HandlerRequest) -> MatchResult + Send + Sync + 'static,
    ) -> Self {
        self.custom = Some(Arc::new(f));
        self
    }

    /// Register a pattern for every supported verb.
    #[must_use]
    pub fn all(mut self, pattern: impl Into<PatternSpec>) -> Self {
        self.table.push_all(pattern.into());
        self
    }

    /// Register a GET pattern (HEAD requests match GET patterns too).
    #[must_use]
    pub fn get(mut self, pattern: impl Into<PatternSpec>) -> Self {
        self.table.push(Method::GET, pattern.into());
        self
    }

    /// Register a POST pattern.
    #[must_use]
    pub fn post(mut self, pattern: impl Into<PatternSpec>) -> Self {
        self.table.push(Method::POST, pattern.into());
        self
    }

    /// Register a PUT pattern.
    #[must_use]
    pub fn put(mut self, pattern: impl Into<PatternSpec>) -> Self {
        self.table.push(Method::PUT, pattern.into());
        self
    }

    /// Register a PATCH pattern.
    #[must_use]
    pub fn patch(mut self, pattern: impl Into<PatternSpec>) -> Self {
        self.table.push(Method::PATCH, pattern.into());
        self
    }

    /// Register a DELETE pattern.
    #[must_use]
    pub fn delete(mut self, pattern: impl Into<PatternSpec>) -> Self {
        self.table.push(Method::DELETE, pattern.into());
        self
    }

    /// Register an OPTIONS pattern.
    #[must_use]
    pub fn options(mut self, pattern: impl Into<PatternSpec>) -> Self {
        self.table.push(Method::OPTIONS, pattern.into());
        self
    }

    /// Append a normal processing layer.
    #[must_use]
    pub fn bind(
        mut self,
        f: impl Fn(&HandlerRequest, &Responder, &mut Next<'_>) + Send + Sync + 'static,
    ) -> Self {
        self.layers.push(Layer::Normal(Arc::new(f) as NormalFn));
        self
    }

    /// Append an error-handling layer and mark the route as an error
    /// handler.
    #[must_use]
    pub fn bind_err(
        mut self,
        f: impl Fn(Option<DispatchError>, &HandlerRequest, &Responder, &mut Next<'_>)
            + Send
            + Sync
            + 'static,
    ) -> Self {
        self.error_handler = true;
        self.layers.push(Layer::Error(Arc::new(f) as ErrorFn));
        self
    }

    #[must_use]
    pub fn is_parallel(&self) -> bool {
        self.parallel
    }

    #[must_use]
    pub fn is_catch_all(&self) -> bool {
        self.catch_all
    }

    /// True when at least one layer was bound with [`bind_err`](Route::bind_err).
    ///
    /// Such a route keeps an in-flight error instead of forwarding it, and
    /// is a valid target for the router's error-recovery scan.
    #[must_use]
    pub fn is_error_handler(&self) -> bool {
        self.error_handler
    }

    /// True when every layer is an error handler. Purely error-handling
    /// routes never see normal traffic: the router enters them only through
    /// the error-recovery scan.
    #[must_use]
    pub fn is_error_only(&self) -> bool {
        self.error_handler && self.layers.iter().all(Layer::is_error_layer)
    }

    #[must_use]
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    #[must_use]
    pub fn pattern_count(&self) -> usize {
        self.table.pattern_count()
    }

    pub(crate) fn layer(&self, idx: usize) -> Option<&Layer> {
        self.layers.get(idx)
    }

    /// Decide whether this route applies to `request`.
    ///
    /// Catch-all wins outright; a custom matcher (if installed) replaces the
    /// table; otherwise the pattern table is scanned in registration order
    /// against the lowercased request path.
    #[must_use]
    pub fn matches(&self, request: &HandlerRequest) -> MatchResult {
        if self.catch_all {
            return MatchResult::Plain;
        }
        if let Some(custom) = &self.custom {
            return custom(request);
        }
        match_request(&self.table, request)
    }

    /// Entry point used by the router for every route it tries.
    ///
    /// `callback` is the caller's continuation: invoked with no error when
    /// this route declines or its chain runs out cleanly, and with an error
    /// the route could not recover. A parallel route invokes the callback
    /// immediately and finishes its own chain detached, on a fresh
    /// coroutine.
    pub fn handle(
        self: &Arc<Self>,
        request: &Arc<HandlerRequest>,
        responder: &Responder,
        mut callback: Option<Callback<'_>>,
        error: Option<DispatchError>,
    ) {
        if self.parallel {
            if let Some(cb) = callback.take() {
                cb(None);
            }
            self.spawn_detached(request, responder, error);
            return;
        }

        match self.matches(request) {
            MatchResult::Miss => {
                if let Some(cb) = callback.take() {
                    cb(None);
                }
            }
            MatchResult::Plain => self.run_chain(request, responder, None, callback, error),
            MatchResult::Captured(caps) => {
                self.run_chain(request, responder, Some(caps), callback, error)
            }
        }
    }

    /// Run the layer chain for a matched request.
    ///
    /// A single-layer route takes the fast path: the layer is invoked
    /// directly with a continuation already positioned past the chain.
    /// Longer chains start by advancing the continuation once with the
    /// initial error, so a route entered in error-recovery mode begins its
    /// search for an error layer immediately.
    pub(crate) fn run_chain(
        &self,
        request: &Arc<HandlerRequest>,
        responder: &Responder,
        captures: Option<CaptureVec>,
        callback: Option<Callback<'_>>,
        error: Option<DispatchError>,
    ) {
        match self.layers.len() {
            0 => {
                if let Some(cb) = callback {
                    cb(error);
                }
            }
            1 => {
                let mut next = Next::new(self, request, responder, captures, 1, callback);
                match &self.layers[0] {
                    Layer::Error(f) => f(error, request, responder, &mut next),
                    Layer::Normal(f) => f(request, responder, &mut next),
                }
            }
            _ => {
                let mut next = Next::new(self, request, responder, captures, 0, callback);
                next.advance(error);
            }
        }
    }

    fn spawn_detached(
        self: &Arc<Self>,
        request: &Arc<HandlerRequest>,
        responder: &Responder,
        error: Option<DispatchError>,
    ) {
        let route = Arc::clone(self);
        let request = Arc::clone(request);
        let responder = responder.clone();
        let stack_size = RuntimeConfig::from_env().stack_size;

        // SAFETY: may::coroutine::Builder::spawn() is marked unsafe by the
        // may runtime. The closure owns everything it touches (Arc'd route
        // and request, cloned responder) and is Send + 'static, so nothing
        // outlives its borrow.
        #[allow(unsafe_code)]
        let spawned = unsafe {
            coroutine::Builder::new().stack_size(stack_size).spawn(move || {
                match route.matches(&request) {
                    MatchResult::Miss => {}
                    MatchResult::Plain => route.run_chain(&request, &responder, None, None, error),
                    MatchResult::Captured(caps) => {
                        route.run_chain(&request, &responder, Some(caps), None, error)
                    }
                }
            })
        };

        if let Err(err) = spawned {
            error!(
                error = %err,
                stack_size,
                "failed to spawn detached chain coroutine"
            );
        }
    }
}

impl Default for Route {
    fn default() -> Self {
        Self::new()
    }
}
