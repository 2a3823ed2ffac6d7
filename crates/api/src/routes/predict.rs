//! Prediction Route

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};
use inference_engine::{InferenceResult, Prediction};
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::{ApiError, AppState};

/// Multipart field carrying the upload
pub const FILE_FIELD: &str = "file";

pub const PREDICTIONS_TOTAL: &str = "predictions_total";
pub const PREDICTION_ERRORS_TOTAL: &str = "prediction_errors_total";
pub const INFERENCE_LATENCY_SECONDS: &str = "inference_latency_seconds";

/// An uploaded file pulled out of the multipart body
struct Upload {
    content_type: Option<String>,
    bytes: Vec<u8>,
}

/// Classify an uploaded image
pub async fn predict(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Prediction>, ApiError> {
    match classify(&state, multipart).await {
        Ok(result) => {
            metrics::counter!(PREDICTIONS_TOTAL, "class" => result.prediction.label.clone())
                .increment(1);
            metrics::histogram!(INFERENCE_LATENCY_SECONDS)
                .record(result.latency_ms as f64 / 1000.0);
            Ok(Json(result.prediction))
        }
        Err(e) => {
            match &e {
                ApiError::Internal(reason) => error!("Prediction failed: {}", reason),
                other => warn!("Rejected upload: {}", other),
            }
            metrics::counter!(PREDICTION_ERRORS_TOTAL, "kind" => e.kind()).increment(1);
            Err(e)
        }
    }
}

async fn classify(
    state: &AppState,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<InferenceResult, ApiError> {
    let upload = read_upload(multipart?).await?;

    let is_image = upload
        .content_type
        .as_deref()
        .is_some_and(|ct| ct.starts_with("image/"));
    if !is_image {
        return Err(ApiError::NotAnImage);
    }

    debug!(
        "Classifying {} byte upload ({})",
        upload.bytes.len(),
        upload.content_type.as_deref().unwrap_or_default()
    );

    // The forward pass is CPU bound; keep it off the reactor threads
    let engine = Arc::clone(&state.engine);
    let result = tokio::task::spawn_blocking(move || engine.predict(&upload.bytes))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;

    Ok(result)
}

/// Find the `file` field, skipping any other form fields
async fn read_upload(mut multipart: Multipart) -> Result<Upload, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await?.to_vec();
        return Ok(Upload { content_type, bytes });
    }

    Err(ApiError::MissingFile)
}
