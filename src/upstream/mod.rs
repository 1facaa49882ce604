//! Outbound side of the proxy.
//!
//! # Data Flow
//! ```text
//! validated Url + inbound method/headers/body
//!     → builder.rs (OutboundRequest: sanitized headers, body only for POST/PUT/PATCH)
//!     → client.rs (Upstream impl: one attempt, timeout, bounded redirects, TLS verified)
//!     → OutboundResult | UpstreamError (error.rs)
//! ```
//!
//! # Design Decisions
//! - The executor is a trait so the handler can be driven without a network
//! - A call returns its status, headers and body as one value; nothing is
//!   collected through side channels
//! - No retries: a single attempt per inbound request

pub mod builder;
pub mod client;
pub mod error;

use async_trait::async_trait;
use axum::http::{HeaderMap, Method, StatusCode};
use bytes::Bytes;
use url::Url;

pub use builder::build_outbound;
pub use client::HttpUpstream;
pub use error::{UpstreamError, UpstreamErrorKind};

/// Everything needed to perform one outbound call.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

/// What the upstream answered.
#[derive(Debug, Clone)]
pub struct OutboundResult {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Executes outbound requests.
#[async_trait]
pub trait Upstream: Send + Sync + std::fmt::Debug {
    async fn send(&self, request: OutboundRequest) -> Result<OutboundResult, UpstreamError>;
}
