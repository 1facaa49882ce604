//! Configuration validation.
//!
//! Serde handles syntax; this module checks meaning. Every problem is
//! collected so an operator sees them all at once.

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::ProxyConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("upstream.allowed_hosts must not be empty")]
    EmptyAllowlist,

    #[error("upstream.allowed_hosts entry {0:?} is not a bare hostname")]
    InvalidAllowedHost(String),

    #[error("{field} must be greater than zero")]
    ZeroValue { field: &'static str },

    #[error("{field} {value:?} is not a valid socket address")]
    InvalidAddress { field: &'static str, value: String },

    #[error("upstream.user_agent must not be empty")]
    EmptyUserAgent,

    #[error(
        "limits.request_secs ({request_secs}) must exceed upstream.timeout_secs ({timeout_secs})"
    )]
    RequestTimeoutTooShort { request_secs: u64, timeout_secs: u64 },
}

/// Validate a parsed configuration.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.upstream.allowed_hosts.is_empty() {
        errors.push(ValidationError::EmptyAllowlist);
    }
    for host in &config.upstream.allowed_hosts {
        if !is_bare_hostname(host) {
            errors.push(ValidationError::InvalidAllowedHost(host.clone()));
        }
    }

    if config.upstream.timeout_secs == 0 {
        errors.push(ValidationError::ZeroValue { field: "upstream.timeout_secs" });
    }
    if config.upstream.connect_timeout_secs == 0 {
        errors.push(ValidationError::ZeroValue { field: "upstream.connect_timeout_secs" });
    }
    if config.limits.request_secs == 0 {
        errors.push(ValidationError::ZeroValue { field: "limits.request_secs" });
    }
    if config.limits.max_body_bytes == 0 {
        errors.push(ValidationError::ZeroValue { field: "limits.max_body_bytes" });
    }

    // The upstream timeout has to fire first so it surfaces as a JSON 502.
    if config.limits.request_secs != 0
        && config.upstream.timeout_secs != 0
        && config.limits.request_secs <= config.upstream.timeout_secs
    {
        errors.push(ValidationError::RequestTimeoutTooShort {
            request_secs: config.limits.request_secs,
            timeout_secs: config.upstream.timeout_secs,
        });
    }

    if config.upstream.user_agent.trim().is_empty() {
        errors.push(ValidationError::EmptyUserAgent);
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// A bare hostname has no scheme, port, path, userinfo or wildcard.
fn is_bare_hostname(host: &str) -> bool {
    !host.is_empty()
        && host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
        && !host.starts_with('.')
        && !host.ends_with('.')
}
