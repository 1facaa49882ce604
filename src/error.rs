//! Error taxonomy for the proxy pipeline.
//!
//! Every variant is terminal for its request and maps to exactly one HTTP
//! status and one JSON body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::upstream::error::{UpstreamError, UpstreamErrorKind};

pub const MISSING_TARGET_MESSAGE: &str = "Missing 'url' parameter.";
pub const FORBIDDEN_TARGET_MESSAGE: &str = "Access to this domain is not permitted.";
pub const BODY_TOO_LARGE_MESSAGE: &str = "Request body too large.";

/// Errors that end a proxied request.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("no target url supplied")]
    MissingTarget,

    #[error("target url is invalid: {reason}")]
    InvalidTarget { reason: String },

    #[error("target host {host} is not on the allowlist")]
    ForbiddenTarget { host: String },

    #[error("request body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },

    #[error("failed to read request body: {0}")]
    BodyRead(String),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

/// JSON body written for every failure.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<UpstreamErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempted_url: Option<String>,
}

impl ErrorBody {
    fn message(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            error_kind: None,
            attempted_url: None,
        }
    }
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::MissingTarget | ProxyError::BodyRead(_) => StatusCode::BAD_REQUEST,
            ProxyError::InvalidTarget { .. } | ProxyError::ForbiddenTarget { .. } => {
                StatusCode::FORBIDDEN
            }
            ProxyError::BodyTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ProxyError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Short label for logs and metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            ProxyError::MissingTarget => "missing_target",
            ProxyError::InvalidTarget { .. } => "invalid_target",
            ProxyError::ForbiddenTarget { .. } => "forbidden_target",
            ProxyError::BodyTooLarge { .. } => "body_too_large",
            ProxyError::BodyRead(_) => "body_read",
            ProxyError::Upstream(_) => "upstream",
        }
    }

    /// The caller-facing body. Validation failures share one message so the
    /// response does not reveal which check rejected the target.
    pub fn body(&self) -> ErrorBody {
        match self {
            ProxyError::MissingTarget => ErrorBody::message(MISSING_TARGET_MESSAGE),
            ProxyError::InvalidTarget { .. } | ProxyError::ForbiddenTarget { .. } => {
                ErrorBody::message(FORBIDDEN_TARGET_MESSAGE)
            }
            ProxyError::BodyTooLarge { .. } => ErrorBody::message(BODY_TOO_LARGE_MESSAGE),
            ProxyError::BodyRead(_) => ErrorBody::message("Failed to read request body."),
            ProxyError::Upstream(e) => ErrorBody {
                error: format!("Upstream request failed: {}", e.message),
                error_kind: Some(e.kind),
                attempted_url: Some(e.attempted_url.clone()),
            },
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}
