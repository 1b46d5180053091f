use super::request::parse_request;
use super::response::write_response;
use crate::response::{Responder, ResponseParts};
use crate::router::Router;
use http::Method;
use may::sync::mpsc;
use may_minihttp::{HttpService, Request, Response};
use std::io;
use std::sync::Arc;
use tracing::warn;

/// `HttpService` implementation bridging the host server and the router.
///
/// Per request the service parses the raw request, binds a [`Responder`] to
/// a fresh reply channel, runs dispatch, and then blocks on the channel for
/// the terminal response. Blocking — rather than using whatever dispatch
/// left behind when it returned — is what lets parallel routes and layers
/// that defer their continuation finish after the dispatch walk unwinds.
#[derive(Clone)]
pub struct AppService {
    pub router: Arc<Router>,
}

impl AppService {
    pub fn new(router: Arc<Router>) -> Self {
        Self { router }
    }
}

impl HttpService for AppService {
    fn call(&mut self, req: Request, res: &mut Response) -> io::Result<()> {
        let request = Arc::new(parse_request(req));
        let head = request.method == Method::HEAD;

        let (tx, rx) = mpsc::channel();
        let responder = Responder::new(tx, head, self.router.default_headers());

        self.router.dispatch(Arc::clone(&request), responder);

        match rx.recv() {
            Ok(parts) => write_response(res, parts),
            Err(_) => {
                // Every responder clone is gone and nothing was sent: the
                // dispatch ended in an unrecoverable signal no observer
                // answered. The router stays silent by contract, so the host
                // closes the request out itself.
                warn!(
                    request_id = %request.request_id,
                    method = %request.method,
                    path = %request.path,
                    "dispatch finished without a response"
                );
                let body = serde_json::json!({
                    "error": "no response produced",
                    "path": request.path,
                });
                write_response(
                    res,
                    ResponseParts {
                        status: 500,
                        headers: vec![(
                            "content-type".to_string(),
                            "application/json".to_string(),
                        )],
                        body: body.to_string().into_bytes(),
                    },
                );
            }
        }
        Ok(())
    }
}
