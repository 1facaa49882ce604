//! HTTP server setup and the proxy handler.
//!
//! # Responsibilities
//! - Create the Axum Router; every path and method lands on the proxy handler
//! - Wire up middleware (request ID, tracing, request timeout)
//! - Run the pipeline: extract → validate → build → execute → relay
//! - Serve until the shutdown signal fires
//!
//! # Request states
//! ```text
//! Received → Validating ─┬─▶ Rejected (400/403/413)
//!                        └─▶ Building → Executing ─┬─▶ Failed → ErrorRelayed (502)
//!                                                  └─▶ Succeeded → ResponseRelayed
//! ```

use axum::{
    body::Body,
    extract::State,
    http::{header, request::Parts, Request},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::ProxyConfig;
use crate::error::ProxyError;
use crate::http::request::{propagate_request_id_layer, request_id, set_request_id_layer};
use crate::http::response::relay;
use crate::observability::metrics;
use crate::security::limits::read_body;
use crate::security::target::{extract_target, find_param, AllowList, TargetValidator, TARGET_PARAM};
use crate::upstream::{build_outbound, HttpUpstream, OutboundResult, Upstream};

/// Application state injected into handlers. Read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub validator: Arc<TargetValidator>,
    pub upstream: Arc<dyn Upstream>,
    pub max_body_bytes: usize,
}

/// HTTP server for the forwarding proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a server that forwards through a reqwest client built from `config`.
    pub fn new(config: ProxyConfig) -> Result<Self, reqwest::Error> {
        let upstream = HttpUpstream::new(&config.upstream)?;
        Ok(Self::with_upstream(config, Arc::new(upstream)))
    }

    /// Create a server around any `Upstream` implementation.
    pub fn with_upstream(config: ProxyConfig, upstream: Arc<dyn Upstream>) -> Self {
        let validator = TargetValidator::new(AllowList::new(&config.upstream.allowed_hosts));
        let state = AppState {
            validator: Arc::new(validator),
            upstream,
            max_body_bytes: config.limits.max_body_bytes,
        };

        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        Router::new()
            .route("/", any(proxy_handler))
            .route("/{*path}", any(proxy_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(set_request_id_layer())
                    .layer(TraceLayer::new_for_http())
                    .layer(propagate_request_id_layer())
                    .layer(TimeoutLayer::new(Duration::from_secs(config.limits.request_secs))),
            )
    }

    /// A clone of the router, for driving the server without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            allowed_hosts = self.config.upstream.allowed_hosts.len(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Main proxy handler.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = request_id(request.headers());
    let method = request.method().clone();

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        "Proxying request"
    );

    match forward(&state, request, &request_id).await {
        Ok(result) => {
            let status = result.status.as_u16();
            tracing::info!(
                request_id = %request_id,
                method = %method,
                status,
                elapsed_ms = start_time.elapsed().as_millis() as u64,
                "Relayed upstream response"
            );
            metrics::record_request(method.as_str(), status, "relayed", start_time);
            relay(result)
        }
        Err(err) => {
            log_failure(&request_id, &err);
            metrics::record_request(method.as_str(), err.status().as_u16(), err.reason(), start_time);
            if !matches!(err, ProxyError::Upstream(_)) {
                metrics::record_rejection(err.reason());
            }
            err.into_response()
        }
    }
}

/// Run one request through the pipeline.
async fn forward(
    state: &AppState,
    request: Request<Body>,
    request_id: &str,
) -> Result<OutboundResult, ProxyError> {
    let (parts, body) = request.into_parts();

    // The query decides before any body is read; a form body is only
    // consulted when the query has no target.
    let (url, body) = match extract_target(parts.uri.query(), None) {
        Some(target) => {
            let url = state.validator.validate(Some(target.as_str()))?;
            (url, read_body(&parts.headers, body, state.max_body_bytes).await?)
        }
        None if is_form(&parts) => {
            // A form body that cannot be read cannot supply a target.
            let bytes = read_body(&parts.headers, body, state.max_body_bytes)
                .await
                .map_err(|_| ProxyError::MissingTarget)?;
            let target = find_param(&bytes, TARGET_PARAM);
            (state.validator.validate(target.as_deref())?, bytes)
        }
        None => return Err(ProxyError::MissingTarget),
    };

    let outbound = build_outbound(&parts.method, url, &parts.headers, body);
    tracing::debug!(
        request_id = %request_id,
        method = %outbound.method,
        target = %outbound.url,
        forwarded_headers = outbound.headers.len(),
        has_body = outbound.body.is_some(),
        "Forwarding to upstream"
    );

    Ok(state.upstream.send(outbound).await?)
}

fn is_form(parts: &Parts) -> bool {
    parts
        .headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| {
            v.trim_start()
                .to_ascii_lowercase()
                .starts_with("application/x-www-form-urlencoded")
        })
        .unwrap_or(false)
}

fn log_failure(request_id: &str, err: &ProxyError) {
    match err {
        ProxyError::ForbiddenTarget { host } => {
            tracing::warn!(request_id = %request_id, host = %host, "Target host not on allowlist");
        }
        ProxyError::Upstream(e) => {
            tracing::error!(
                request_id = %request_id,
                kind = %e.kind,
                url = %e.attempted_url,
                error = %e.message,
                "Upstream error"
            );
        }
        other => {
            tracing::info!(request_id = %request_id, error = %other, "Request rejected");
        }
    }
}
