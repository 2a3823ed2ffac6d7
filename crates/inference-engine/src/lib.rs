//! Tomato Leaf Inference Engine
//!
//! Image classification using an ONNX model executed by tract-onnx.
//! Decodes uploaded bytes, stretches them to the model input size and maps
//! the output probability vector back to a class label.

mod engine;
mod labels;
pub mod mock;
mod model;
pub mod preprocess;

pub use engine::{InferenceEngine, InferenceResult, Prediction};
pub use labels::ClassLabels;
pub use mock::{ChannelMeanModel, FixedOutputModel};
pub use model::{Model, TractModel};
pub use preprocess::ImageTensor;

use thiserror::Error;

/// Model input width in pixels
pub const INPUT_WIDTH: u32 = 224;
/// Model input height in pixels
pub const INPUT_HEIGHT: u32 = 224;
/// Color channels fed to the model (RGB)
pub const INPUT_CHANNELS: usize = 3;

/// Default model artifact, resolved against the working directory
pub const DEFAULT_MODEL_PATH: &str = "tomato.onnx";

/// Errors during inference
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Model load failed: {0}")]
    ModelLoadError(String),
    #[error("Label set has {labels} entries but model produces {outputs} outputs")]
    LabelMismatch { labels: usize, outputs: usize },
    #[error("Invalid image: {0}")]
    InvalidImage(String),
    #[error("Inference failed: {0}")]
    InferenceFailed(String),
    #[error("Invalid input shape: expected {expected}, got {actual}")]
    InvalidInputShape { expected: String, actual: String },
}

impl InferenceError {
    /// True when the failure was caused by the uploaded bytes themselves
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, InferenceError::InvalidImage(_))
    }
}
