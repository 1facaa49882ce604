//! Allowlisted single-hop HTTP forwarding proxy.
//!
//! A caller names a destination in the `url` parameter; the proxy checks the
//! host against a fixed allowlist, forwards method, sanitized headers and
//! body, and relays status, a narrow set of headers, and the body back.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;
pub mod upstream;

pub use config::schema::ProxyConfig;
pub use error::ProxyError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use upstream::{OutboundRequest, OutboundResult, Upstream};
