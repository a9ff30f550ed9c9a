//! prefix-router
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http::server ──▶ routing::registry ──▶ load_balancer::strategy
//!                                       (prefix lookup)        (alive replica)
//!                                                                    │
//!     Client Response                                                ▼
//!     ◀────────────── http::server ◀── http::forward ◀──────── Replica ◀── Backend
//!
//!     health::active (one task per service group) ──▶ Replica liveness
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

use prefix_router::config::load_config;
use prefix_router::observability::{logging, metrics};
use prefix_router::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "prefix-router")]
#[command(about = "Path-prefix HTTP load balancer", long_about = None)]
struct Cli {
    /// The config file to load services from.
    #[arg(short, long = "config-path")]
    config_path: PathBuf,

    /// Port to listen on; overrides the port of `listener.bind_address`.
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = load_config(&cli.config_path)?;
    logging::init_tracing(&config.observability.log_level);

    tracing::info!("prefix-router v{} starting", env!("CARGO_PKG_VERSION"));

    if let Some(port) = cli.port {
        config.listener.bind_address = with_port(&config.listener.bind_address, port);
    }

    tracing::info!(
        bind_address = %config.listener.bind_address,
        services = config.services.len(),
        health_checks = config.health_check.enabled,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = HttpServer::new(config)?;

    // Nothing triggers this besides Ctrl+C, which the server watches itself.
    let shutdown = Shutdown::new();
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Replace the port of a `host:port` bind address. Hostnames and `[v6]` literals are kept as is.
fn with_port(bind_address: &str, port: u16) -> String {
    let host = match bind_address.rsplit_once(':') {
        Some((host, tail)) if !tail.contains(']') => host,
        _ => bind_address,
    };
    format!("{}:{}", host, port)
}
