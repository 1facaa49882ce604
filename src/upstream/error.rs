//! Outbound transport failures.
//!
//! A failed outbound call never yields an `OutboundResult`. It yields an
//! `UpstreamError` that records what was attempted and a classified reason.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Coarse classification of a transport failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpstreamErrorKind {
    /// The overall deadline elapsed.
    Timeout,
    /// TCP connect, DNS resolution or TLS handshake failed.
    Connect,
    /// The redirect hop ceiling was exceeded.
    Redirect,
    /// The outbound request could not be built or sent.
    Request,
    /// The response body could not be read.
    Body,
    /// Anything the transport could not classify.
    Other,
}

impl UpstreamErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Connect => "connect",
            Self::Redirect => "redirect",
            Self::Request => "request",
            Self::Body => "body",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for UpstreamErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An outbound call that did not produce a response.
#[derive(Debug, Clone, Error)]
#[error("{kind} error reaching {attempted_url}: {message}")]
pub struct UpstreamError {
    pub kind: UpstreamErrorKind,
    pub attempted_url: String,
    pub message: String,
}

impl UpstreamError {
    pub fn new(
        kind: UpstreamErrorKind,
        attempted_url: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            attempted_url: attempted_url.into(),
            message: message.into(),
        }
    }

    /// Classify a reqwest failure.
    ///
    /// Timeout is checked first since reqwest can flag a connect timeout as
    /// both `is_connect` and `is_timeout`.
    pub fn from_reqwest(err: &reqwest::Error, attempted_url: &str) -> Self {
        let kind = if err.is_timeout() {
            UpstreamErrorKind::Timeout
        } else if err.is_connect() {
            UpstreamErrorKind::Connect
        } else if err.is_redirect() {
            UpstreamErrorKind::Redirect
        } else if err.is_body() || err.is_decode() {
            UpstreamErrorKind::Body
        } else if err.is_request() || err.is_builder() {
            UpstreamErrorKind::Request
        } else {
            UpstreamErrorKind::Other
        };

        Self::new(kind, attempted_url, error_chain(err))
    }
}

/// Flatten an error and its sources into one line.
///
/// reqwest's top-level message is generic ("error sending request"); the
/// useful detail (connection refused, certificate problem) sits in the chain.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}
