//! Allowlisted forwarding proxy (v1)
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌──────────────────────────────────────────────────────┐
//!                     │                   FORWARD PROXY                      │
//!                     │                                                      │
//!   ?url=<encoded>    │  ┌─────────┐   ┌──────────┐   ┌─────────────────┐    │
//!  ───────────────────┼─▶│  http   │──▶│ security │──▶│    upstream     │────┼──▶ Allowlisted
//!                     │  │ server  │   │ target + │   │ builder + client│    │    upstream
//!                     │  └─────────┘   │ headers  │   └────────┬────────┘    │
//!                     │                └──────────┘            │             │
//!   status + body     │  ┌──────────┐                          │             │
//!  ◀──────────────────┼──│ response │◀─────────────────────────┘             │
//!                     │  │  relay   │                                        │
//!                     │  └──────────┘                                        │
//!                     │                                                      │
//!                     │   config · observability · lifecycle                 │
//!                     └──────────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;

use forward_proxy::config::{load_config, validation::validate_config, ConfigError, ProxyConfig};
use forward_proxy::lifecycle::{startup, Shutdown};
use forward_proxy::observability::logging;

#[derive(Parser)]
#[command(name = "forward-proxy")]
#[command(about = "Forward HTTP requests to an allowlist of upstream hosts", long_about = None)]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,

    /// Add a host to the allowlist (repeatable).
    #[arg(short, long = "allow")]
    allow: Vec<String>,
}

fn resolve_config(args: &Args) -> Result<ProxyConfig, ConfigError> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };

    if let Some(bind) = &args.bind {
        config.listener.bind_address = bind.clone();
    }
    config.upstream.allowed_hosts.extend(args.allow.iter().cloned());

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = resolve_config(&args)?;

    logging::init(&config.observability.log_level);
    tracing::info!("forward-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    let shutdown = Shutdown::new();
    shutdown.trigger_on_signal();

    startup::run(config, &shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
