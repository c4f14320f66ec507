//! lanserve: HTTPS static file server for LAN testing.
//!
//! This is the application entry point. It initializes tracing, loads the
//! optional configuration file, applies command line overrides, and runs the
//! HTTPS server until interrupted.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lanserve::config::{AppConfig, DEFAULT_LOG_FILTER};
use lanserve::start_server;

/// lanserve: serve the current directory over self-signed HTTPS
#[derive(Parser, Debug)]
#[command(name = "lanserve", version, about)]
struct Args {
    /// Path to an optional TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// HTTPS port (default: 8443)
    #[arg(short, long)]
    port: Option<u16>,

    /// Directory to serve (default: current directory)
    #[arg(short, long)]
    dir: Option<PathBuf>,

    /// Log level filter (e.g., "lanserve=debug,tower_http=info")
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = AppConfig::load_or_default(args.config.as_ref())?;
    if let Some(port) = args.port {
        config.http.port = port;
    }
    if let Some(dir) = args.dir {
        config.serve.root = dir;
    }

    // Initialize tracing with priority: CLI > env > default
    let log_filter = args
        .log_level
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

    let registry =
        tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::new(&log_filter));
    if config.logging.is_json() {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    tracing::info!(
        host = %config.http.host,
        port = config.http.port,
        root = %config.serve.root.display(),
        "Loaded configuration"
    );

    start_server(config).await?;

    Ok(())
}
