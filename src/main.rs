//! Authorization-gated SPARQL reverse proxy.
//!
//! Mediates access to a protected backend (typically a SPARQL endpoint).
//! Callers present a bearer credential; the proxy exchanges it with a
//! token-validation service for the backend's base URL, then forwards
//! the request using one of three strategies.
//!
//! # Architecture Overview
//!
//! ```text
//!                  ┌────────────────────────────────────────────────┐
//!                  │                 SPARQL PROXY                    │
//!  Client Request  │  ┌──────────┐   ┌────────────┐   ┌──────────┐  │
//!  ────────────────┼─▶│   http   │──▶│ auth gate  │──▶│classifier│  │
//!                  │  │  server  │   │(authorizer)│   └────┬─────┘  │
//!                  │  └──────────┘   └────────────┘        │        │
//!                  │                                       ▼        │
//!  Client Response │  ┌──────────┐                  ┌──────────┐    │     Backend
//!  ◀───────────────┼──│ response │◀─────────────────│forwarder │◀───┼──── (SPARQL
//!                  │  │  relay   │                  │(3 paths) │    │     endpoint)
//!                  │  └──────────┘                  └──────────┘    │
//!                  │                                                │
//!                  │  config · observability · lifecycle            │
//!                  └────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sparql_proxy::config::{load_config, ProxyConfig};
use sparql_proxy::http::HttpServer;
use sparql_proxy::lifecycle::Shutdown;
use sparql_proxy::observability::metrics;

#[derive(Parser)]
#[command(name = "sparql-proxy")]
#[command(about = "Authorization-gated SPARQL reverse proxy", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file. Defaults apply if omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sparql_proxy=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = match cli.config {
        Some(path) => load_config(&path)?,
        None => ProxyConfig::default(),
    };

    tracing::info!(
        bind_address = %config.listener.bind_address,
        authorizer_endpoint = %config.authorizer.endpoint,
        upstream_timeout_secs = config.timeouts.upstream_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => {
                // Unreachable after validation when loaded from file;
                // guards the default-config path.
                tracing::error!(
                    metrics_address = %config.observability.metrics_address,
                    "Failed to parse metrics address"
                );
            }
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let shutdown_rx = shutdown.subscribe();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            shutdown.trigger();
        }
    });

    let server = HttpServer::new(config);
    server.run(listener, shutdown_rx).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
