//! Tomato Disease Prediction API Server
//!
//! REST API exposing an image classification model: a health check, an
//! upload endpoint returning the predicted class, and Prometheus metrics.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

pub mod config;
pub mod error;
mod routes;

pub use crate::config::ServerConfig;
pub use crate::error::{ApiError, ServerError};
pub use routes::ping::PING_MESSAGE;

use inference_engine::InferenceEngine;

/// Application state shared across handlers.
///
/// Read-only after startup, so handlers share it without locking.
pub struct AppState {
    /// Loaded model and label set
    pub engine: Arc<InferenceEngine>,
    /// Prometheus render handle, when a recorder is installed
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create new application state around a loaded engine
    pub fn new(engine: InferenceEngine) -> Self {
        Self {
            engine: Arc::new(engine),
            metrics: None,
        }
    }

    /// Attach a Prometheus handle so `/metrics` can render
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

/// Create the application router
pub fn create_router(state: Arc<AppState>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/ping", get(routes::ping::ping))
        .route("/predict", post(routes::predict::predict))
        .route("/metrics", get(routes::metrics::render))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Initialize logging
pub fn init_logging(level: Level) -> Result<(), ServerError> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| ServerError::Logging(e.to_string()))
}

/// Install the global Prometheus recorder and describe the service metrics
pub fn init_metrics() -> Result<PrometheusHandle, ServerError> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| ServerError::Metrics(e.to_string()))?;

    metrics::describe_counter!(
        routes::predict::PREDICTIONS_TOTAL,
        "Successful predictions by class"
    );
    metrics::describe_counter!(
        routes::predict::PREDICTION_ERRORS_TOTAL,
        "Failed prediction requests by error kind"
    );
    metrics::describe_histogram!(
        routes::predict::INFERENCE_LATENCY_SECONDS,
        metrics::Unit::Seconds,
        "Model forward pass latency"
    );

    info!("Metrics recorder installed");
    Ok(handle)
}

/// Run the server until SIGINT or SIGTERM
pub async fn run_server(config: &ServerConfig, state: AppState) -> Result<(), ServerError> {
    let addr = config.bind_addr();
    let app = create_router(Arc::new(state), config.max_upload_bytes);

    info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    warn!("Shutdown signal received, stopping server...");
}
