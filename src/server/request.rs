use crate::ids::RequestId;
use crate::request::HandlerRequest;
use http::Method;
use may_minihttp::Request;
use std::collections::HashMap;
use std::io::Read;
use tracing::{debug, info};

/// Parse cookies out of an already-lowercased header map.
pub fn parse_cookies(headers: &HashMap<String, String>) -> HashMap<String, String> {
    headers
        .get("cookie")
        .map(|c| {
            c.split(';')
                .filter_map(|pair| {
                    let mut parts = pair.trim().splitn(2, '=');
                    let name = parts.next()?.trim().to_string();
                    let value = parts.next().unwrap_or("").trim().to_string();
                    Some((name, value))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Parse query string parameters from a URL path.
///
/// Extracts everything after the `?` character and URL-decodes parameter
/// names and values.
pub fn parse_query_params(path: &str) -> HashMap<String, String> {
    if let Some(pos) = path.find('?') {
        let query_str = &path[pos + 1..];
        url::form_urlencoded::parse(query_str.as_bytes())
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    } else {
        HashMap::new()
    }
}

/// Extract a [`HandlerRequest`] from a raw `may_minihttp` request.
///
/// Splits the query string off the path, lowercases header names, parses
/// cookies and query parameters, and keeps the body only when it parses as
/// JSON. The request id comes from an `x-request-id` header when the client
/// sent a valid one.
pub fn parse_request(req: Request) -> HandlerRequest {
    let method_str = req.method().to_string();
    let raw_path = req.path().to_string();
    let path = raw_path.split('?').next().unwrap_or("/").to_string();
    let http_version = format!("{:?}", req.version());

    let headers: HashMap<String, String> = req
        .headers()
        .iter()
        .map(|h| {
            (
                h.name.to_ascii_lowercase(),
                String::from_utf8_lossy(h.value).to_string(),
            )
        })
        .collect();

    let cookies = parse_cookies(&headers);
    let query_params = parse_query_params(&raw_path);
    let request_id = RequestId::from_header_or_new(headers.get("x-request-id").map(String::as_str));

    let body = {
        let mut body_str = String::new();
        if let Ok(size) = req.body().read_to_string(&mut body_str) {
            if size > 0 {
                let body_result: Result<serde_json::Value, _> = serde_json::from_str(&body_str);
                if body_result.is_err() {
                    debug!(
                        request_id = %request_id,
                        body_size_bytes = size,
                        "request body is not JSON, ignored"
                    );
                }
                body_result.ok()
            } else {
                None
            }
        } else {
            None
        }
    };

    let method = method_str.parse().unwrap_or(Method::GET);

    info!(
        request_id = %request_id,
        method = %method,
        path = %path,
        http_version = %http_version,
        headers_count = headers.len(),
        "HTTP request parsed"
    );

    HandlerRequest {
        request_id,
        method,
        path,
        query_params,
        headers,
        cookies,
        body,
    }
}
