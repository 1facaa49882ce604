//! reqwest-backed outbound executor.
//!
//! # Responsibilities
//! - Perform exactly one outbound call per request
//! - Bound it by the configured total timeout and connect timeout
//! - Follow redirects up to a fixed hop ceiling, and only to allowlisted hosts
//! - Verify TLS certificates, always
//!
//! # Design Decisions
//! - One `reqwest::Client` is built at startup and shared; it pools
//!   connections but keeps no per-request state (no cookie store)
//! - The client ignores `HTTP_PROXY`-style environment variables: this
//!   process is itself the egress point
//! - The configured user agent is a client default, so a caller-supplied
//!   `User-Agent` header still wins

use async_trait::async_trait;
use reqwest::redirect::Policy;
use std::time::Duration;

use crate::config::UpstreamConfig;
use crate::security::target::AllowList;
use crate::upstream::error::UpstreamError;
use crate::upstream::{OutboundRequest, OutboundResult, Upstream};

/// Production `Upstream` over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpUpstream {
    client: reqwest::Client,
}

impl HttpUpstream {
    /// Build the shared client from configuration.
    pub fn new(config: &UpstreamConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .redirect(redirect_policy(
                AllowList::new(&config.allowed_hosts),
                config.max_redirects,
            ))
            .user_agent(config.user_agent.clone())
            .no_proxy()
            .build()?;

        Ok(Self { client })
    }
}

/// Follow at most `max` hops, each to a host on `allowlist`.
///
/// A redirect is a new target; it gets the same host check the caller's
/// target did.
fn redirect_policy(allowlist: AllowList, max: usize) -> Policy {
    Policy::custom(move |attempt| {
        if attempt.previous().len() > max {
            return attempt.error(format!("too many redirects (limit {max})"));
        }
        let refusal = match attempt.url().host_str() {
            Some(host) if allowlist.contains(host) => None,
            Some(host) => Some(format!("redirect to {host} is not on the allowlist")),
            None => Some("redirect target has no host".to_string()),
        };
        match refusal {
            None => attempt.follow(),
            Some(reason) => attempt.error(reason),
        }
    })
}

#[async_trait]
impl Upstream for HttpUpstream {
    async fn send(&self, request: OutboundRequest) -> Result<OutboundResult, UpstreamError> {
        let attempted_url = request.url.to_string();

        let mut builder = self
            .client
            .request(request.method, request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| UpstreamError::from_reqwest(&e, &attempted_url))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| UpstreamError::from_reqwest(&e, &attempted_url))?;

        tracing::debug!(
            url = %attempted_url,
            status = %status,
            bytes = body.len(),
            "Upstream responded"
        );

        Ok(OutboundResult {
            status,
            headers,
            body,
        })
    }
}
