use crate::error::DispatchError;
use crate::request::HandlerRequest;
use crate::response::Responder;
use crate::route::{Callback, Next, Route};
use crate::runtime_config::RuntimeConfig;
use std::collections::HashMap;
use std::io;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Observer of router-level failure signals.
///
/// Subscribed with [`Router::subscribe_errors`] and invoked synchronously,
/// in subscription order. The router never writes a response for an
/// unrecoverable error itself — answering (or crashing) is observer policy,
/// which is why the responder is part of the signal.
pub trait ErrorObserver: Send + Sync {
    /// An error no error-handling route could recover, or a synthesized
    /// not-found when dispatch ran out of routes.
    fn on_unrecoverable(
        &self,
        error: &DispatchError,
        request: &HandlerRequest,
        responder: &Responder,
    );

    /// A transport-level error reported by the host server.
    fn on_transport_error(&self, _error: &io::Error) {}
}

/// Construction-time settings for a [`Router`].
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Environment name used by [`Router::configure`] blocks
    pub env: String,
    /// Headers applied to every response unless a layer set them itself
    pub default_headers: HashMap<String, String>,
}

impl RouterConfig {
    /// Environment from `CASCADE_ENV` (default `development`) and the stock
    /// `server` default header.
    pub fn from_env() -> Self {
        let runtime = RuntimeConfig::from_env();
        let mut default_headers = HashMap::new();
        default_headers.insert(
            "server".to_string(),
            concat!("cascade/", env!("CARGO_PKG_VERSION")).to_string(),
        );
        Self {
            env: runtime.env,
            default_headers,
        }
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// The dispatch engine: an ordered list of routes walked per request.
///
/// Routes are appended during setup (insertion order is priority order,
/// irrevocable afterwards) and the router is shared immutably with the host
/// server for dispatch. On each request the router tries routes in order,
/// advancing whenever one declines or finishes; any error a route cannot
/// recover is carried forward to the first error-handling route after it,
/// and past the last route it becomes an unrecoverable-error signal for the
/// subscribed [`ErrorObserver`]s.
pub struct Router {
    routes: Vec<Arc<Route>>,
    default_headers: Arc<HashMap<String, String>>,
    observers: Vec<Arc<dyn ErrorObserver>>,
    env: String,
    settings: HashMap<String, String>,
}

impl Router {
    /// A router configured from the environment ([`RouterConfig::from_env`]).
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(RouterConfig::from_env())
    }

    #[must_use]
    pub fn with_config(config: RouterConfig) -> Self {
        Self {
            routes: Vec::new(),
            default_headers: Arc::new(config.default_headers),
            observers: Vec::new(),
            env: config.env,
            settings: HashMap::new(),
        }
    }

    /// Append a route. Order of mounting is order of dispatch.
    pub fn mount(&mut self, route: Route) -> &mut Self {
        info!(
            index = self.routes.len(),
            parallel = route.is_parallel(),
            catch_all = route.is_catch_all(),
            error_handler = route.is_error_handler(),
            patterns = route.pattern_count(),
            layers = route.layer_count(),
            "route mounted"
        );
        self.routes.push(Arc::new(route));
        self
    }

    /// Mount a catch-all route with a single normal layer.
    pub fn bind(
        &mut self,
        f: impl Fn(&HandlerRequest, &Responder, &mut Next<'_>) + Send + Sync + 'static,
    ) -> &mut Self {
        self.mount(Route::catch_all().bind(f))
    }

    /// Mount a catch-all route with a single error-handling layer.
    pub fn bind_err(
        &mut self,
        f: impl Fn(Option<DispatchError>, &HandlerRequest, &Responder, &mut Next<'_>)
            + Send
            + Sync
            + 'static,
    ) -> &mut Self {
        self.mount(Route::catch_all().bind_err(f))
    }

    /// Subscribe an observer for unrecoverable and transport errors.
    pub fn subscribe_errors(&mut self, observer: Arc<dyn ErrorObserver>) -> &mut Self {
        self.observers.push(observer);
        self
    }

    /// Store a named setting.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.settings.insert(key.into(), value.into());
        self
    }

    /// Read back a setting stored with [`set`](Router::set).
    #[must_use]
    pub fn setting(&self, key: &str) -> Option<&str> {
        self.settings.get(key).map(String::as_str)
    }

    /// Environment name this router was configured with.
    #[must_use]
    pub fn env(&self) -> &str {
        &self.env
    }

    /// Run `f` against this router when `env` names the active environment.
    pub fn configure(&mut self, env: &str, f: impl FnOnce(&mut Self)) -> &mut Self {
        if self.env == env {
            f(self);
        }
        self
    }

    /// Routes in dispatch order.
    #[must_use]
    pub fn routes(&self) -> &[Arc<Route>] {
        &self.routes
    }

    /// Default headers shared into every per-request responder.
    #[must_use]
    pub fn default_headers(&self) -> Arc<HashMap<String, String>> {
        Arc::clone(&self.default_headers)
    }

    /// Print all registered routes to stdout.
    ///
    /// Useful for verifying dispatch order during setup.
    pub fn dump_routes(&self) {
        println!("[routes] count={}", self.routes.len());
        for (idx, route) in self.routes.iter().enumerate() {
            println!(
                "[route] #{idx} parallel={} catch_all={} error_handler={} patterns={} layers={}",
                route.is_parallel(),
                route.is_catch_all(),
                route.is_error_handler(),
                route.pattern_count(),
                route.layer_count()
            );
        }
    }

    /// Dispatch one request through the route list.
    ///
    /// With no routes mounted at all the router answers 404 immediately — the
    /// single automatic response it ever writes. Otherwise the walk is primed
    /// by invoking the first eligible route directly; all further advancement
    /// happens through the continuation each route receives.
    pub fn dispatch(&self, request: Arc<HandlerRequest>, responder: Responder) {
        debug!(
            request_id = %request.request_id,
            method = %request.method,
            path = %request.path,
            routes = self.routes.len(),
            "dispatch start"
        );

        if self.routes.is_empty() {
            responder.send_status(404);
            return;
        }

        self.invoke_from(0, &request, &responder, None);
    }

    /// Forward a host transport error to the subscribed observers.
    pub fn transport_error(&self, err: &io::Error) {
        error!(error = %err, "transport error reported by host");
        for observer in &self.observers {
            observer.on_transport_error(err);
        }
    }

    /// Top-level continuation: try routes at or after `cursor`.
    ///
    /// Without an error in flight the next route carrying normal layers
    /// runs (purely error-handling routes are passed over); exhaustion
    /// synthesizes a not-found error. With an error in flight the scan looks
    /// for the first error-handling route instead; exhaustion makes the
    /// error unrecoverable. Either terminal emits the observer signal
    /// exactly once.
    fn invoke_from(
        &self,
        cursor: usize,
        request: &Arc<HandlerRequest>,
        responder: &Responder,
        error: Option<DispatchError>,
    ) {
        match error {
            Some(err) => {
                let target = self
                    .routes
                    .iter()
                    .enumerate()
                    .skip(cursor)
                    .find(|(_, route)| route.is_error_handler());
                match target {
                    Some((idx, route)) => {
                        debug!(
                            request_id = %request.request_id,
                            route = idx,
                            error = %err,
                            "entering error-handling route"
                        );
                        let callback: Callback<'_> =
                            Box::new(move |e| self.invoke_from(idx + 1, request, responder, e));
                        route.handle(request, responder, Some(callback), Some(err));
                    }
                    None => self.emit_unrecoverable(err, request, responder),
                }
            }
            None => {
                let target = self
                    .routes
                    .iter()
                    .enumerate()
                    .skip(cursor)
                    .find(|(_, route)| !route.is_error_only());
                match target {
                    Some((idx, route)) => {
                        let callback: Callback<'_> =
                            Box::new(move |e| self.invoke_from(idx + 1, request, responder, e));
                        route.handle(request, responder, Some(callback), None);
                    }
                    None => {
                        let err = DispatchError::NotFound {
                            url: request.path.clone(),
                        };
                        self.emit_unrecoverable(err, request, responder);
                    }
                }
            }
        }
    }

    fn emit_unrecoverable(
        &self,
        err: DispatchError,
        request: &Arc<HandlerRequest>,
        responder: &Responder,
    ) {
        error!(
            request_id = %request.request_id,
            path = %request.path,
            error = %err,
            observers = self.observers.len(),
            "unrecoverable dispatch error"
        );
        for observer in &self.observers {
            observer.on_unrecoverable(&err, request, responder);
        }
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}
