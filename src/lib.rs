//! # cascade-router
//!
//! **cascade-router** is a coroutine-powered middleware router for Rust: an
//! ordered list of routes, each carrying a chain of processing layers that a
//! request cascades through via an explicit continuation, with dedicated
//! error-handling layers that intercept failures raised anywhere along the
//! way.
//!
//! ## Architecture
//!
//! The library is organized into a handful of modules:
//!
//! - **[`router`]** - the dispatch engine: ordered route walk, error-recovery
//!   scan, unrecoverable-error observers
//! - **[`route`]** - match tables (exact + regex patterns, catch-all, custom
//!   matchers), the layer chain and its continuation (`Next`)
//! - **[`response`]** - the per-request `Responder`: response composition,
//!   terminal send helpers, HEAD neutralization, default headers
//! - **[`request`]** - the parsed request type handed to every layer
//! - **[`error`]** - the `DispatchError` carried through failing chains
//! - **[`server`]** - host integration on `may_minihttp`: request parsing,
//!   the `HttpService` bridge, server lifecycle
//! - **[`ids`]** / **[`runtime_config`]** - ULID request identity and
//!   environment-driven runtime settings
//!
//! ## Request Handling Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Client
//!     participant Server as HttpServer<br/>(may_minihttp)
//!     participant Router as Router
//!     participant Route as Route
//!     participant Chain as Layer Chain
//!
//!     Client->>Server: HTTP Request
//!     Server->>Server: Parse (headers, query, body)
//!     Server->>Router: dispatch(request, responder)
//!     Router->>Route: handle(request, responder, continuation)
//!     Route->>Route: match (patterns / catch-all / custom)
//!
//!     alt No match
//!         Route-->>Router: decline → next route
//!     end
//!
//!     Route->>Chain: advance continuation
//!     Chain->>Chain: layer 1 … layer N<br/>(normal layers skipped while<br/>an error is in flight)
//!
//!     alt Layer sends
//!         Chain-->>Server: ResponseParts via reply channel
//!         Server-->>Client: HTTP Response
//!     else Chain runs out
//!         Chain-->>Router: continuation → next route
//!     else Unrecoverable error
//!         Router->>Router: notify ErrorObservers
//!     end
//! ```
//!
//! ## Quick Start
//!
//! ```no_run
//! use cascade_router::{AppService, HttpServer, PatternSpec, Route, Router};
//! use std::sync::Arc;
//!
//! let mut router = Router::new();
//!
//! // Logging layer: touch the request, pass it on.
//! router.bind(|req, _res, next| {
//!     println!("{} {}", req.method, req.path);
//!     next.proceed();
//! });
//!
//! // One route, several shapes, one chain.
//! router.mount(
//!     Route::new()
//!         .get("/pets")
//!         .get(PatternSpec::regex(r"^/pets/(\d+)$"))
//!         .bind(|_req, res, next| match next.capture(0) {
//!             Some(id) => res.send_json(200, &serde_json::json!({ "id": id })),
//!             None => res.send_json(200, &serde_json::json!({ "pets": [] })),
//!         }),
//! );
//!
//! // Failures anywhere above land here.
//! router.bind_err(|err, _req, res, _next| {
//!     let status = err.as_ref().map(|e| e.status()).unwrap_or(500);
//!     res.send_json(status, &serde_json::json!({ "error": "request failed" }));
//! });
//!
//! let service = AppService::new(Arc::new(router));
//! let handle = HttpServer(service).start("0.0.0.0:8080").unwrap();
//! handle.join().unwrap();
//! ```
//!
//! ## Dispatch Semantics
//!
//! - Routes run strictly in mount order; a route declines by invoking its
//!   continuation, which moves the router to the next route.
//! - A layer signals failure with `next.fail(err)` (or by panicking, on
//!   chains longer than one layer). Normal layers are transparent to an
//!   in-flight error — they are skipped, not invoked — so only layers bound
//!   with `bind_err` ever observe failures.
//! - Routes holding only error layers are skipped during normal dispatch
//!   and entered only by the error-recovery scan.
//! - A `parallel` route returns control to the router immediately; its own
//!   chain finishes on a separate coroutine in whatever order scheduling
//!   allows.
//! - Errors that pass the last error-handling route, and requests that
//!   exhaust the route list, surface through [`ErrorObserver`] — the router
//!   writes no response for them itself.
//!
//! ## Runtime Considerations
//!
//! cascade-router runs on the `may` coroutine runtime, not tokio. Layers are
//! plain synchronous functions executing on the request's coroutine; a layer
//! that blocks (I/O, channel waits) suspends only that request. Detached
//! parallel chains get their own coroutines whose stack size is set by
//! `CASCADE_STACK_SIZE` (see [`runtime_config`]).

pub mod error;
pub mod ids;
pub mod request;
pub mod response;
pub mod route;
pub mod router;
pub mod runtime_config;
pub mod server;

pub use error::DispatchError;
pub use request::HandlerRequest;
pub use response::{ReplySender, Responder, ResponseParts};
pub use route::{CaptureVec, Layer, MatchResult, Next, PatternSpec, Route};
pub use router::{ErrorObserver, Router, RouterConfig};
pub use server::{AppService, HttpServer, ServerHandle};
