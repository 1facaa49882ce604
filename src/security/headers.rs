//! Header sanitization in both directions.
//!
//! # Responsibilities
//! - Strip hop-by-hop and transport-managed headers before forwarding
//! - Relay only a narrow set of upstream response headers to the caller
//!
//! # Design Decisions
//! - Header names are `HeaderName` values, already canonical lowercase, so
//!   membership checks are case-insensitive without string folding
//! - Response relay uses an allowlist, never a denylist: upstream
//!   infrastructure headers (Server, Set-Cookie, Via...) do not leak

use axum::http::header::{self, HeaderMap, HeaderName};
use std::collections::HashSet;
use std::sync::OnceLock;

/// A lookup set of canonical header names.
#[derive(Debug, Clone, Default)]
pub struct HeaderSet {
    names: HashSet<HeaderName>,
}

impl HeaderSet {
    pub fn new(names: impl IntoIterator<Item = HeaderName>) -> Self {
        Self {
            names: names.into_iter().collect(),
        }
    }

    pub fn contains(&self, name: &HeaderName) -> bool {
        self.names.contains(name)
    }

    /// Copy every entry of `headers` whose name is NOT in this set.
    /// Multi-valued headers keep all their values.
    pub fn strip_from(&self, headers: &HeaderMap) -> HeaderMap {
        let mut out = HeaderMap::with_capacity(headers.len());
        for (name, value) in headers.iter() {
            if !self.contains(name) {
                out.append(name.clone(), value.clone());
            }
        }
        out
    }

    /// Copy every entry of `headers` whose name IS in this set.
    pub fn retain_from(&self, headers: &HeaderMap) -> HeaderMap {
        let mut out = HeaderMap::new();
        for (name, value) in headers.iter() {
            if self.contains(name) {
                out.append(name.clone(), value.clone());
            }
        }
        out
    }
}

/// Headers that must not cross the proxy towards the upstream.
///
/// Connection-scoped headers, plus `content-length` which the transport
/// recomputes from the body it actually sends.
pub fn hop_by_hop() -> &'static HeaderSet {
    static SET: OnceLock<HeaderSet> = OnceLock::new();
    SET.get_or_init(|| {
        HeaderSet::new([
            header::HOST,
            header::CONNECTION,
            HeaderName::from_static("keep-alive"),
            header::PROXY_AUTHENTICATE,
            header::PROXY_AUTHORIZATION,
            header::TE,
            header::TRAILER,
            HeaderName::from_static("trailers"),
            header::TRANSFER_ENCODING,
            header::UPGRADE,
            HeaderName::from_static("proxy-connection"),
            header::CONTENT_LENGTH,
        ])
    })
}

/// Upstream response headers relayed to the caller.
///
/// `content-encoding` travels with the body because the body is relayed
/// without decompression.
pub fn relayed_response_headers() -> &'static HeaderSet {
    static SET: OnceLock<HeaderSet> = OnceLock::new();
    SET.get_or_init(|| {
        HeaderSet::new([
            header::CONTENT_TYPE,
            header::CACHE_CONTROL,
            header::PRAGMA,
            header::CONTENT_ENCODING,
        ])
    })
}

/// Header names a sender listed in `Connection`; they are hop-by-hop too.
pub fn connection_tokens(headers: &HeaderMap) -> HeaderSet {
    HeaderSet::new(
        headers
            .get_all(header::CONNECTION)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(','))
            .filter_map(|token| HeaderName::from_bytes(token.trim().as_bytes()).ok()),
    )
}

/// Inbound headers with the hop-by-hop set, and anything `Connection`
/// names, removed.
pub fn sanitize_outbound(headers: &HeaderMap) -> HeaderMap {
    let listed = connection_tokens(headers);
    let mut out = hop_by_hop().strip_from(headers);
    if !listed.names.is_empty() {
        out = listed.strip_from(&out);
    }
    out
}

/// Upstream response headers reduced to the relay allowlist.
pub fn filter_relayed(headers: &HeaderMap) -> HeaderMap {
    relayed_response_headers().retain_from(headers)
}
