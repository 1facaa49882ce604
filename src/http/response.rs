//! Response relay.
//!
//! # Responsibilities
//! - Turn an `OutboundResult` into the caller's response
//! - Pass the upstream status through unchanged
//! - Relay only the narrow header allowlist
//! - Write the body byte-for-byte
//!
//! # Design Decisions
//! - Only content-type, cache-control, pragma and content-encoding are
//!   relayed; the forward-everything policy is deliberately not offered
//! - Failures never reach this module; they render through `ProxyError`

use axum::{body::Body, response::Response};

use crate::security::headers::filter_relayed;
use crate::upstream::OutboundResult;

/// Build the caller-facing response for a successful outbound call.
pub fn relay(result: OutboundResult) -> Response {
    let mut response = Response::new(Body::from(result.body));
    *response.status_mut() = result.status;
    *response.headers_mut() = filter_relayed(&result.headers);
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, HeaderValue, StatusCode};
    use bytes::Bytes;
    use http_body_util::BodyExt;

    #[tokio::test]
    async fn test_relay_preserves_status_and_body() {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("application/json"));
        headers.insert("server", HeaderValue::from_static("upstream/1.0"));
        headers.insert("x-powered-by", HeaderValue::from_static("php"));

        let response = relay(OutboundResult {
            status: StatusCode::CREATED,
            headers,
            body: Bytes::from_static(b"{\"id\":42}"),
        });

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()["content-type"], "application/json");
        assert!(response.headers().get("server").is_none());
        assert!(response.headers().get("x-powered-by").is_none());

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"{\"id\":42}");
    }

    #[tokio::test]
    async fn test_relay_keeps_non_success_status() {
        let response = relay(OutboundResult {
            status: StatusCode::IM_A_TEAPOT,
            headers: HeaderMap::new(),
            body: Bytes::from_static(&[0xff, 0x00, 0x10]),
        });

        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], &[0xff, 0x00, 0x10]);
    }
}
