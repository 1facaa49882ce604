use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use std::path::{Path, PathBuf};
use url::Url;

use forward_proxy::config::load_config;
use forward_proxy::security::{AllowList, TargetValidator};

#[derive(Parser)]
#[command(name = "proxy-cli")]
#[command(about = "Companion CLI for the forwarding proxy", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a request to a target through a running proxy
    Send {
        /// Base URL of the proxy
        #[arg(short, long, default_value = "http://localhost:8080")]
        proxy: String,

        /// HTTP method
        #[arg(short = 'X', long, default_value = "GET")]
        method: String,

        /// Extra header, "Name: value" (repeatable)
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,

        /// Request body
        #[arg(short, long)]
        data: Option<String>,

        /// Destination URL, unencoded
        target: String,
    },
    /// Validate a config file and test targets against its allowlist
    Check {
        #[arg(short, long)]
        config: PathBuf,

        /// Destination URLs to test
        targets: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Send { proxy, method, headers, data, target } => {
            send(&proxy, &method, &headers, data, &target).await?;
        }
        Commands::Check { config, targets } => {
            check(&config, &targets)?;
        }
    }

    Ok(())
}

async fn send(
    proxy: &str,
    method: &str,
    raw_headers: &[String],
    data: Option<String>,
    target: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut url = Url::parse(proxy)?;
    url.query_pairs_mut().append_pair("url", target);

    let mut headers = HeaderMap::new();
    for raw in raw_headers {
        let (name, value) = raw
            .split_once(':')
            .ok_or_else(|| format!("header {raw:?} is not \"Name: value\""))?;
        headers.append(
            HeaderName::from_bytes(name.trim().as_bytes())?,
            HeaderValue::from_str(value.trim())?,
        );
    }

    let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())?;
    let client = reqwest::Client::builder().no_proxy().build()?;
    let mut request = client.request(method, url).headers(headers);
    if let Some(body) = data {
        request = request.body(body);
    }

    let res = request.send().await?;
    println!("{}", res.status());
    for (name, value) in res.headers() {
        println!("{}: {}", name, value.to_str().unwrap_or("<binary>"));
    }
    println!();
    println!("{}", res.text().await?);
    Ok(())
}

fn check(path: &Path, targets: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(path)?;
    println!(
        "Config OK: {} allowed host(s), timeout {}s",
        config.upstream.allowed_hosts.len(),
        config.upstream.timeout_secs
    );

    let validator = TargetValidator::new(AllowList::new(&config.upstream.allowed_hosts));
    for target in targets {
        match validator.validate(Some(target.as_str())) {
            Ok(url) => println!("allowed    {url}"),
            Err(e) => println!("rejected   {target} ({e})"),
        }
    }
    Ok(())
}
