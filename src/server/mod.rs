//! Host HTTP server integration built on `may_minihttp`.
//!
//! The router core never touches sockets: it consumes a parsed
//! [`HandlerRequest`](crate::request::HandlerRequest) and a
//! [`Responder`](crate::response::Responder) handed to it by a host. This
//! module is that host — request parsing, the `HttpService` bridge with its
//! reply-channel wait, and a thin server lifecycle wrapper.

pub mod http_server;
pub mod request;
pub mod response;
pub mod service;

pub use http_server::{HttpServer, ServerHandle};
pub use request::{parse_cookies, parse_query_params, parse_request};
pub use response::write_response;
pub use service::AppService;
