use crate::response::ResponseParts;
use dashmap::DashMap;
use may_minihttp::Response;
use once_cell::sync::Lazy;

fn status_reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        204 => "No Content",
        301 => "Moved Permanently",
        302 => "Found",
        304 => "Not Modified",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "OK",
    }
}

// The host server borrows header lines as &'static str. Each distinct
// "name: value" line is leaked exactly once and reused afterwards.
static HEADER_LINES: Lazy<DashMap<String, &'static str>> = Lazy::new(DashMap::new);

fn header_line(name: &str, value: &str) -> &'static str {
    let key = format!("{name}: {value}");
    if let Some(line) = HEADER_LINES.get(&key) {
        return *line;
    }
    let leaked: &'static str = Box::leak(key.clone().into_boxed_str());
    HEADER_LINES.insert(key, leaked);
    leaked
}

/// Write finished [`ResponseParts`] onto the host response.
///
/// `Content-Length` is skipped — the host computes it from the body bytes
/// it actually writes, which for HEAD requests is an empty body.
pub fn write_response(res: &mut Response, parts: ResponseParts) {
    let reason = status_reason(parts.status);
    res.status_code(parts.status as usize, reason);
    for (name, value) in &parts.headers {
        if name.eq_ignore_ascii_case("content-length") {
            continue;
        }
        res.header(header_line(name, value));
    }
    res.body_vec(parts.body);
}
