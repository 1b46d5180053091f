//! # Route Module
//!
//! A [`Route`] pairs a match decision with a chain of processing layers.
//!
//! ## Matching
//!
//! Each route carries an ordered per-verb pattern table (exact lowercased
//! strings and regular expressions, evaluated strictly in registration
//! order), or a catch-all flag, or a custom matcher closure that replaces
//! the table. Regex capture groups are delivered to layers through
//! [`Next::capture`]. When several regex patterns on one route match the
//! same request, the captures of the last matching pattern win.
//!
//! ## Dispatch
//!
//! `handle` computes the match and, on a hit, drives the request through
//! the layer chain with a continuation ([`Next`]):
//!
//! - a single-layer route invokes its layer directly (fast path);
//! - longer chains advance layer by layer, skipping normal layers while an
//!   error is in flight and converting synchronous layer panics into
//!   in-flight errors;
//! - a `parallel` route invokes the caller's continuation immediately and
//!   runs its own chain detached on a fresh coroutine.

mod chain;
mod core;
mod matcher;

pub use chain::{Callback, ErrorFn, Layer, Next, NormalFn};
pub use core::{CustomMatcher, Route};
pub use matcher::{CaptureVec, MatchResult, PatternSpec, MAX_INLINE_CAPTURES};
