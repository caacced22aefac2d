//! Ride booking gateway.
//!
//! ```text
//!     Client ──▶ request id ──▶ rate limit ──▶ handler ──▶ validator
//!                                                 │
//!                                                 ▼
//!     Client ◀── envelope ◀──── translate ◀── upstream client ◀──▶ Booking API
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use ride_gateway::config::{load_config, load_from_env};
use ride_gateway::lifecycle::signals::shutdown_signal;
use ride_gateway::observability::{logging, metrics};
use ride_gateway::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "ride-gateway")]
#[command(about = "HTTP gateway for the ground-transportation booking API", long_about = None)]
struct Args {
    /// TOML configuration file; defaults apply when omitted.
    #[arg(short, long, env = "GATEWAY_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => load_from_env()?,
    };

    logging::init(&config.observability)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config_file = ?args.config,
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.base_url,
        timeout_secs = config.upstream.timeout_secs,
        rate_limit_enabled = config.rate_limit.enabled,
        "Configuration loaded"
    );

    if config.upstream.api_key.is_empty() {
        tracing::warn!("No upstream API key configured; set GATEWAY_API_KEY or upstream.api_key");
    }

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
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        trigger.trigger();
    });

    let server = HttpServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
