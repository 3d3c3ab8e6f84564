//! Book gateway server.
//!
//! ```text
//!     Client Request
//!     ──▶ request id ─▶ trace ─▶ metrics ─▶ security headers ─▶ CORS
//!     ──▶ catch panic ─▶ body limit ─▶ timeout ─▶ compression
//!     ──▶ health-check bypass ─▶ route validation ─▶ rate limit ─▶ handler
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tokio::net::TcpListener;

use book_gateway::config::{load_config, validation::redact};
use book_gateway::lifecycle::{spawn_signal_handler, Shutdown};
use book_gateway::observability::{init_logging, init_metrics};
use book_gateway::HttpServer;

#[derive(Parser)]
#[command(name = "book-gateway")]
#[command(about = "HTTP API gateway for the book service", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long, env = "GATEWAY_CONFIG")]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            // Logging is not configured yet.
            eprintln!("fatal: failed to load configuration: {err}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    init_logging(config.log_level(), config.observability.json_logs);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "book-gateway starting");
    tracing::info!(
        profile = ?config.profile,
        bind_address = %config.listener.bind_address,
        storage = %redact(config.storage_url()),
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => {
                if let Err(err) = init_metrics(addr) {
                    tracing::error!(error = %err, "Failed to start metrics exporter");
                }
            }
            Err(err) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %err,
                "Failed to parse metrics address"
            ),
        }
    }

    match run(config).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(error = %err, "Server failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: book_gateway::GatewayConfig) -> Result<(), Box<dyn std::error::Error>> {
    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(config).await?;
    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    spawn_signal_handler(shutdown);

    server.run(listener, rx).await?;
    Ok(())
}
