//! Tomato Disease Prediction API - Main Entry Point

use api::{init_logging, init_metrics, run_server, AppState, ServerConfig, ServerError};
use inference_engine::{ClassLabels, InferenceEngine, DEFAULT_MODEL_PATH};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    let config = ServerConfig::from_env()?;
    init_logging(config.level())?;

    info!("=== Tomato Disease API v{} ===", env!("CARGO_PKG_VERSION"));

    let metrics = init_metrics()?;

    // No model, no service
    let engine = InferenceEngine::load(DEFAULT_MODEL_PATH, ClassLabels::tomato()).map_err(|e| {
        error!("Failed to load model: {}", e);
        e
    })?;
    info!("Model ready: {}", engine.model_name());

    run_server(&config, AppState::new(engine).with_metrics(metrics)).await
}
