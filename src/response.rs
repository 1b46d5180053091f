//! Per-request response capability.
//!
//! A [`Responder`] is created by the host integration for every incoming
//! request and shared (cheaply, via `Arc`) with every layer that runs for it.
//! Layers compose a response with [`status`](Responder::status),
//! [`set_header`](Responder::set_header) and [`write`](Responder::write), or
//! use one of the terminal helpers (`send_json`, `send_text`, ...). Calling
//! [`end`](Responder::end) — directly or through a helper — finishes the
//! request: the accumulated [`ResponseParts`] are pushed down the reply
//! channel the host is blocked on. There is no other "done" signal; a chain
//! that never sends leaves the host waiting.
//!
//! The first terminal send wins. Later sends are logged and ignored — the
//! engine treats concurrent writers as a caller error, it does not arbitrate.
//!
//! For HEAD requests body writes are neutralized: status and headers flow
//! through unchanged while the body stays empty, so handlers written for GET
//! behave correctly when probed with HEAD.

use may::sync::mpsc;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{error, warn};

/// A finished response: what the engine hands back to the host server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseParts {
    /// HTTP status code (200, 404, 500, etc.)
    pub status: u16,
    /// Response headers in insertion order
    pub headers: Vec<(String, String)>,
    /// Response body bytes (always empty for HEAD requests)
    pub body: Vec<u8>,
}

impl ResponseParts {
    /// Look up a header by name (case-insensitive).
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Channel sender carrying the finished response back to the host.
pub type ReplySender = mpsc::Sender<ResponseParts>;

struct ResponderState {
    status: Option<u16>,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
    tx: Option<ReplySender>,
    sent: bool,
}

struct ResponderInner {
    head: bool,
    defaults: Arc<HashMap<String, String>>,
    state: Mutex<ResponderState>,
}

/// Shared handle for composing and terminally sending one response.
#[derive(Clone)]
pub struct Responder {
    inner: Arc<ResponderInner>,
}

impl Responder {
    /// Bind a responder to a reply channel.
    ///
    /// `head` neutralizes body writes; `defaults` are the router's default
    /// headers, merged in at [`end`](Responder::end) without overriding
    /// anything set explicitly.
    pub fn new(tx: ReplySender, head: bool, defaults: Arc<HashMap<String, String>>) -> Self {
        Self {
            inner: Arc::new(ResponderInner {
                head,
                defaults,
                state: Mutex::new(ResponderState {
                    status: None,
                    headers: Vec::new(),
                    body: Vec::new(),
                    tx: Some(tx),
                    sent: false,
                }),
            }),
        }
    }

    // A panicking layer is caught upstream and must not wedge the responder,
    // so lock poisoning is ignored.
    fn state(&self) -> MutexGuard<'_, ResponderState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// True when this responder suppresses body bytes (HEAD request).
    #[must_use]
    pub fn is_head(&self) -> bool {
        self.inner.head
    }

    /// True once a terminal send happened.
    #[must_use]
    pub fn is_sent(&self) -> bool {
        self.state().sent
    }

    /// Set the status code sent with [`end`](Responder::end). Defaults to 200.
    pub fn status(&self, code: u16) -> &Self {
        self.state().status = Some(code);
        self
    }

    /// Set a header, replacing any existing value (case-insensitive).
    pub fn set_header(&self, name: impl Into<String>, value: impl Into<String>) -> &Self {
        let name = name.into();
        let mut state = self.state();
        state
            .headers
            .retain(|(k, _)| !k.eq_ignore_ascii_case(&name));
        state.headers.push((name, value.into()));
        self
    }

    /// Read back a header set on this response.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<String> {
        self.state()
            .headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.clone())
    }

    /// Append body bytes. A no-op for HEAD requests.
    pub fn write(&self, chunk: &[u8]) -> &Self {
        if self.inner.head {
            return self;
        }
        let mut state = self.state();
        if state.sent {
            warn!(len = chunk.len(), "write after terminal send ignored");
            return self;
        }
        state.body.extend_from_slice(chunk);
        self
    }

    /// Append a final chunk and terminate the response.
    pub fn end_with(&self, chunk: &[u8]) {
        self.write(chunk);
        self.end();
    }

    /// Terminate the response, flushing status, headers and body to the host.
    pub fn end(&self) {
        let (tx, parts) = {
            let mut state = self.state();
            if state.sent {
                warn!("terminal send repeated, keeping the first response");
                return;
            }
            state.sent = true;

            for (name, value) in self.inner.defaults.iter() {
                if !state.headers.iter().any(|(k, _)| k.eq_ignore_ascii_case(name)) {
                    state.headers.push((name.clone(), value.clone()));
                }
            }

            let parts = ResponseParts {
                status: state.status.unwrap_or(200),
                headers: std::mem::take(&mut state.headers),
                body: std::mem::take(&mut state.body),
            };
            (state.tx.take(), parts)
        };

        match tx {
            Some(tx) => {
                if tx.send(parts).is_err() {
                    warn!("reply channel closed before terminal send");
                }
            }
            None => warn!("terminal send without a reply channel"),
        }
    }

    /// Send a bare status with no body.
    pub fn send_status(&self, status: u16) {
        self.status(status);
        self.end();
    }

    /// Serialize `body` as JSON and send it.
    pub fn send_json<T: Serialize>(&self, status: u16, body: &T) {
        match serde_json::to_vec(body) {
            Ok(bytes) => self.send_full(status, "application/json", &bytes),
            Err(err) => {
                error!(error = %err, "response body serialization failed");
                self.send_full(500, "text/plain", b"response serialization failed");
            }
        }
    }

    /// Send a plain-text body.
    pub fn send_text(&self, status: u16, body: &str) {
        self.send_full(status, "text/plain", body.as_bytes());
    }

    /// Send an HTML body.
    pub fn send_html(&self, status: u16, body: &str) {
        self.send_full(status, "text/html", body.as_bytes());
    }

    /// Answer with a 302 redirect to `location`.
    pub fn redirect(&self, location: &str) {
        self.set_header("location", location);
        self.send_status(302);
    }

    // Content-Length is derived from the payload before HEAD suppression so
    // a HEAD probe reports the same headers as the GET it mirrors.
    fn send_full(&self, status: u16, content_type: &str, content: &[u8]) {
        self.status(status);
        if self.header("content-type").is_none() {
            self.set_header("content-type", content_type);
        }
        if self.header("content-length").is_none() {
            self.set_header("content-length", content.len().to_string());
        }
        self.end_with(content);
    }
}

impl std::fmt::Debug for Responder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("Responder")
            .field("head", &self.inner.head)
            .field("status", &state.status)
            .field("sent", &state.sent)
            .finish()
    }
}
