//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, inbound timeout)
//! - Dispatch `/aggregate` to the orchestrator
//! - Translate propagated failures into structured error responses
//! - Serve until a shutdown signal arrives

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, Uri},
    routing::get,
    Json, Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::admin;
use crate::aggregate::{AggregateResult, Orchestrator};
use crate::config::GatewayConfig;
use crate::http::request::{propagate_request_id_layer, request_id, set_request_id_layer};
use crate::http::response::ApiError;
use crate::lifecycle::signals::shutdown_signal;
use crate::upstream::HttpUpstreamClient;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
}

/// HTTP server for the aggregation gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
}

impl HttpServer {
    /// Create a server backed by the real upstream HTTP client.
    pub fn new(config: GatewayConfig) -> Result<Self, reqwest::Error> {
        let client = Arc::new(HttpUpstreamClient::new(&config.upstreams, &config.timeouts)?);
        let orchestrator = Arc::new(Orchestrator::from_config(&config, client));
        Ok(Self::with_orchestrator(config, orchestrator))
    }

    /// Create a server around an already-built orchestrator.
    pub fn with_orchestrator(config: GatewayConfig, orchestrator: Arc<Orchestrator>) -> Self {
        let state = AppState { orchestrator };
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        Router::new()
            .route("/aggregate", get(aggregate_handler))
            .merge(admin::setup_admin_router())
            .fallback(not_found)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(set_request_id_layer())
                    .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                        tracing::info_span!(
                            "request",
                            method = %request.method(),
                            uri = %request.uri(),
                            request_id = %request_id(request.headers()),
                        )
                    }))
                    .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
                    .layer(propagate_request_id_layer()),
            )
    }

    /// The router, for driving the server in-process.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            posts_url = %self.config.upstreams.posts.url,
            users_url = %self.config.upstreams.users.url,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                tokio::select! {
                    _ = shutdown_signal() => {}
                    _ = shutdown.recv() => {
                        tracing::info!("Shutdown requested");
                    }
                }
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

/// Fan out to both upstreams and return the combined document.
async fn aggregate_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<AggregateResult>, ApiError> {
    tracing::debug!(request_id = %request_id(&headers), "Aggregating upstreams");
    let result = state.orchestrator.handle().await?;
    Ok(Json(result))
}

async fn not_found(uri: Uri) -> ApiError {
    ApiError::not_found(uri.path())
}
