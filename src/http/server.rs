//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, access log, timeout, metrics, trace context)
//! - Bind server to listener and serve until shutdown
//! - Apply hot-reloaded tracing policy

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use axum::{middleware, routing::get, Router};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::ServiceConfig;
use crate::http::handlers;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::observability::metrics::track_metrics;
use crate::observability::tracing::{trace_context_middleware, SharedTracingConfig};

/// HTTP server for the trace context service.
pub struct HttpServer {
    router: Router,
    config: ServiceConfig,
    tracing: SharedTracingConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ServiceConfig) -> Self {
        let tracing = Arc::new(ArcSwap::from_pointee(config.tracing.clone()));
        let router = Self::build_router(&config, tracing.clone());
        Self {
            router,
            config,
            tracing,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ServiceConfig, tracing: SharedTracingConfig) -> Router {
        let routes = Router::new()
            .route("/health", get(handlers::health))
            .route("/info", get(handlers::info));
        Self::apply_layers(routes, config, tracing)
    }

    /// Layers added last run first: request IDs are assigned before the
    /// access log and the trace context middleware see the request, and
    /// metrics wrap the timeout so timed-out requests are counted.
    #[allow(deprecated)]
    fn apply_layers(routes: Router, config: &ServiceConfig, tracing: SharedTracingConfig) -> Router {
        routes
            .layer(middleware::from_fn_with_state(tracing, trace_context_middleware))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(middleware::from_fn(track_metrics))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http())
            .layer(set_request_id_layer())
    }

    /// A clone of the router, for driving the service without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires.
    ///
    /// Configs received on `config_updates` replace the tracing policy;
    /// listener and timeout changes are logged and need a restart.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<ServiceConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let policy = self.tracing.clone();
        let running = self.config.clone();
        let reloader = tokio::spawn(async move {
            while let Some(new_config) = config_updates.recv().await {
                if new_config.listener != running.listener || new_config.timeouts != running.timeouts {
                    tracing::warn!("Listener or timeout changes require a restart and were not applied");
                }
                policy.store(Arc::new(new_config.tracing));
                tracing::info!("Tracing policy reloaded");
            }
        });

        let served = axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await;

        reloader.abort();
        served?;
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
