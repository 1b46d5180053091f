//! # Router Module
//!
//! The [`Router`] owns the ordered route list and drives each incoming
//! request through it.
//!
//! ## Dispatch order
//!
//! Routes are tried strictly in mount order. A route that declines (no
//! match) or whose chain runs out hands the request back through the
//! router's continuation, which advances to the next eligible route.
//! Purely error-handling routes are skipped during normal dispatch; when a
//! route forwards an error, the router instead scans forward for the first
//! error-handling route and enters it with the error.
//!
//! ## Terminal signals
//!
//! Dispatch has exactly three terminals:
//!
//! - a layer terminally sends through its [`Responder`](crate::response::Responder);
//! - the walk exhausts all routes without a match — a not-found error is
//!   synthesized and emitted to the [`ErrorObserver`]s;
//! - an error passes the last error-handling route — it is emitted to the
//!   [`ErrorObserver`]s as unrecoverable.
//!
//! The router itself answers a request only in the degenerate zero-route
//! case (immediate 404).

mod core;

pub use core::{ErrorObserver, Router, RouterConfig};
