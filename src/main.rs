//! Trace context service.
//!
//! # Architecture Overview
//!
//! ```text
//!                          ┌──────────────────────────────────────────────────┐
//!                          │              TRACE CONTEXT SERVICE               │
//!                          │                                                  │
//!     Client Request       │  ┌──────────┐   ┌──────────────┐   ┌──────────┐ │
//!     traceparent: 00-…  ──┼─▶│request id│──▶│ trace context│──▶│ handlers │ │
//!                          │  │ + access │   │  middleware  │   │ /health  │ │
//!                          │  │   log    │   │ extract/span │   │ /info    │ │
//!                          │  └──────────┘   └──────┬───────┘   └────┬─────┘ │
//!                          │                        │ inject         │       │
//!     Client Response      │                        ▼                │       │
//!     traceparent: 00-… ◀──┼────────────────── response ◀────────────┘       │
//!                          │                                                  │
//!                          │  config (toml, hot reload) · logging · metrics   │
//!                          └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use trace_context_service::config::{load_config, validation::validate_config, watcher::ConfigWatcher, ConfigError};
use trace_context_service::observability::{logging, metrics};
use trace_context_service::{HttpServer, ServiceConfig, Shutdown};

#[derive(Parser)]
#[command(name = "trace-context-service")]
#[command(about = "HTTP service extracting and propagating W3C trace context", long_about = None)]
struct Cli {
    /// Path to a TOML config file. Watched for tracing policy changes.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServiceConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
        validate_config(&config).map_err(ConfigError::Validation)?;
    }

    logging::init_logging(&config.observability)?;

    tracing::info!("trace-context-service v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        start_root_span = config.tracing.start_root_span,
        inject_request = config.tracing.inject_request,
        inject_response = config.tracing.inject_response,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics exporter");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    // Keep the watcher alive for the lifetime of the server.
    let (_watcher, config_updates) = match &cli.config {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            match watcher.run() {
                Ok(handle) => (Some(handle), updates),
                Err(e) => {
                    tracing::warn!(error = %e, "Config watcher unavailable, hot reload disabled");
                    (None, updates)
                }
            }
        }
        None => (None, mpsc::unbounded_channel().1),
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    shutdown.trigger_on_signal();

    let server = HttpServer::new(config);
    server.run(listener, config_updates, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
