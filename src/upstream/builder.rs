//! Outbound request construction.

use axum::http::{HeaderMap, Method};
use bytes::Bytes;
use url::Url;

use crate::security::headers::sanitize_outbound;
use crate::upstream::OutboundRequest;

/// Methods whose body is forwarded.
pub fn carries_body(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH)
}

/// Uppercase extension methods; standard methods are already canonical.
pub fn normalize_method(method: &Method) -> Method {
    let upper = method.as_str().to_ascii_uppercase();
    if upper == method.as_str() {
        return method.clone();
    }
    Method::from_bytes(upper.as_bytes()).unwrap_or_else(|_| method.clone())
}

/// Build the outbound descriptor from a validated target and the inbound parts.
///
/// The body is dropped for methods that do not conventionally carry one,
/// even when the caller sent it. An empty body on POST/PUT/PATCH is still
/// attached so the upstream sees `Content-Length: 0`.
pub fn build_outbound(method: &Method, url: Url, headers: &HeaderMap, body: Bytes) -> OutboundRequest {
    let method = normalize_method(method);
    let body = if carries_body(&method) { Some(body) } else { None };

    OutboundRequest {
        method,
        url,
        headers: sanitize_outbound(headers),
        body,
    }
}
