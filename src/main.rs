//! Request-aggregation gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────────┐
//!                        │                 AGGREGATE GATEWAY                │
//!                        │                                                  │
//!   GET /aggregate       │  ┌────────┐    ┌──────────────┐    ┌──────────┐  │       ┌──────────┐
//!   ─────────────────────┼─▶│  http  │───▶│ orchestrator │─┬─▶│ breaker  │──┼──────▶│ posts API│
//!                        │  │ server │    │  (fan-out)   │ │  │ (posts)  │  │       └──────────┘
//!                        │  └────────┘    └──────┬───────┘ │  └──────────┘  │
//!                        │       ▲               │         │  ┌──────────┐  │       ┌──────────┐
//!                        │       │               │         └─▶│ breaker  │──┼──────▶│ users API│
//!                        │       │               ▼            │ (users)  │  │       └──────────┘
//!   200 JSON / error     │  ┌────────┐    ┌──────────────┐    └──────────┘  │
//!   ◀────────────────────┼──│response│◀───│  classifier  │◀── join both     │
//!                        │  └────────┘    └──────────────┘                  │
//!                        │                                                  │
//!                        │  config · observability · lifecycle · admin      │
//!                        └──────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use aggregate_gateway::config::validation::validate_config;
use aggregate_gateway::config::{load_config, ConfigError, GatewayConfig};
use aggregate_gateway::lifecycle::Shutdown;
use aggregate_gateway::observability::{logging, metrics};
use aggregate_gateway::HttpServer;

#[derive(Parser)]
#[command(name = "aggregate-gateway")]
#[command(about = "Joins the post and user APIs behind GET /aggregate", long_about = None)]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long, env = "GATEWAY_CONFIG")]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }
    validate_config(&config).map_err(ConfigError::Validation)?;

    logging::init_logging(&config.observability);

    tracing::info!("aggregate-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        config_path = ?args.config,
        bind_address = %config.listener.bind_address,
        failure_threshold = config.breaker.failure_threshold,
        reset_timeout_ms = config.breaker.reset_timeout_ms,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
