//! Inbound body limits.
//!
//! # Responsibilities
//! - Reject a declared Content-Length over the limit before reading
//! - Buffer the body, stopping at the limit
//!
//! # Design Decisions
//! - Bodies are fully buffered; the limit keeps that bounded
//! - Over-limit bodies map to 413 with the usual JSON error body

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap};
use http_body_util::LengthLimitError;
use std::error::Error as StdError;

use crate::error::ProxyError;

/// Declared Content-Length, if present and numeric.
pub fn declared_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

/// Read the whole body, failing once it passes `limit` bytes.
pub async fn read_body(headers: &HeaderMap, body: Body, limit: usize) -> Result<Bytes, ProxyError> {
    if let Some(len) = declared_length(headers) {
        if len > limit as u64 {
            return Err(ProxyError::BodyTooLarge { limit });
        }
    }

    axum::body::to_bytes(body, limit).await.map_err(|e| {
        if exceeded_limit(&e) {
            ProxyError::BodyTooLarge { limit }
        } else {
            ProxyError::BodyRead(e.to_string())
        }
    })
}

fn exceeded_limit(err: &axum::Error) -> bool {
    let mut source: Option<&(dyn StdError + 'static)> = err.source();
    while let Some(cause) = source {
        if cause.is::<LengthLimitError>() {
            return true;
        }
        source = cause.source();
    }
    false
}
