//! Inference Engine Implementation

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info};

use crate::labels::ClassLabels;
use crate::mock::ChannelMeanModel;
use crate::model::{Model, TractModel};
use crate::preprocess::{self, ImageTensor};
use crate::InferenceError;

/// Prediction result from inference
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    /// Predicted class label
    #[serde(rename = "class")]
    pub label: String,
    /// Highest probability in the output vector
    pub confidence: f64,
}

/// Result of inference operation
#[derive(Debug, Clone)]
pub struct InferenceResult {
    /// The prediction
    pub prediction: Prediction,
    /// Index of the predicted class in the output vector
    pub class_index: usize,
    /// Forward pass latency in milliseconds
    pub latency_ms: u64,
}

/// Image classification engine: one model plus its label set.
///
/// Immutable once built; share it behind an `Arc`.
pub struct InferenceEngine {
    model: Arc<dyn Model>,
    labels: ClassLabels,
}

impl InferenceEngine {
    /// Create an engine, checking the label set against the model's class
    /// count when the model reports one.
    pub fn new(model: Arc<dyn Model>, labels: ClassLabels) -> Result<Self, InferenceError> {
        if labels.is_empty() {
            return Err(InferenceError::ModelLoadError("class label set is empty".to_string()));
        }

        if let Some(outputs) = model.num_classes() {
            if outputs != labels.len() {
                return Err(InferenceError::LabelMismatch {
                    labels: labels.len(),
                    outputs,
                });
            }
        }

        info!(
            "Creating inference engine with model {} ({} classes)",
            model.name(),
            labels.len()
        );
        Ok(Self { model, labels })
    }

    /// Load an ONNX model from disk and pair it with `labels`
    pub fn load(path: impl AsRef<Path>, labels: ClassLabels) -> Result<Self, InferenceError> {
        let model = TractModel::load(path)?;
        Self::new(Arc::new(model), labels)
    }

    /// Create a mock inference engine for testing
    pub fn mock() -> Self {
        Self {
            model: Arc::new(ChannelMeanModel::new()),
            labels: ClassLabels::tomato(),
        }
    }

    /// Classify encoded image bytes
    pub fn predict(&self, bytes: &[u8]) -> Result<InferenceResult, InferenceError> {
        let input = preprocess::prepare(bytes)?;
        self.predict_tensor(&input)
    }

    /// Classify an already prepared input tensor
    pub fn predict_tensor(&self, input: &ImageTensor) -> Result<InferenceResult, InferenceError> {
        let start = Instant::now();
        let probabilities = self.model.forward(input)?;
        let latency_ms = start.elapsed().as_millis() as u64;

        let (class_index, confidence) = argmax(&probabilities)?;
        let label = self.labels.get(class_index).ok_or_else(|| {
            InferenceError::InferenceFailed(format!(
                "class index {} out of range for {} labels",
                class_index,
                self.labels.len()
            ))
        })?;

        debug!(
            "Prediction: {} (conf={:.3}, latency={}ms)",
            label, confidence, latency_ms
        );

        Ok(InferenceResult {
            prediction: Prediction {
                label: label.to_string(),
                confidence: f64::from(confidence),
            },
            class_index,
            latency_ms,
        })
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }
}

/// Index and value of the largest probability; the first index wins ties.
fn argmax(probabilities: &[f32]) -> Result<(usize, f32), InferenceError> {
    if probabilities.is_empty() {
        return Err(InferenceError::InferenceFailed("model produced an empty output".to_string()));
    }
    if let Some(bad) = probabilities.iter().position(|p| !p.is_finite()) {
        return Err(InferenceError::InferenceFailed(format!(
            "model produced non-finite output at index {}",
            bad
        )));
    }

    let mut best = (0, probabilities[0]);
    for (i, &p) in probabilities.iter().enumerate().skip(1) {
        if p > best.1 {
            best = (i, p);
        }
    }
    Ok(best)
}
