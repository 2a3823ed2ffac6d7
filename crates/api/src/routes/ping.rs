//! Health Check Route

use axum::Json;
use serde::Serialize;

/// Fixed liveness message
pub const PING_MESSAGE: &str = "Tomato disease prediction API is running!";

/// Response for the ping endpoint
#[derive(Debug, Serialize)]
pub struct PingResponse {
    pub message: String,
}

/// Liveness check; never touches the model
pub async fn ping() -> Json<PingResponse> {
    Json(PingResponse {
        message: PING_MESSAGE.to_string(),
    })
}
