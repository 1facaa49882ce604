//! Structured logging.
//!
//! Uses the `tracing` crate with an `EnvFilter`. `RUST_LOG` wins over the
//! configured level when it is set.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter directive used when `RUST_LOG` is absent.
pub fn default_directive(log_level: &str) -> String {
    format!("forward_proxy={log_level},tower_http={log_level}")
}

/// Install the global subscriber. Call once, early in `main`.
pub fn init(log_level: &str) {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_directive(log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
