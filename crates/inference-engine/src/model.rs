//! Classification model seam and the tract-onnx implementation

use std::path::Path;

use tract_onnx::prelude::*;
use tracing::{debug, info};

use crate::preprocess::ImageTensor;
use crate::{InferenceError, INPUT_CHANNELS, INPUT_HEIGHT, INPUT_WIDTH};

/// A loaded classification model.
///
/// Implementations are immutable after construction and are shared across
/// requests without locking.
pub trait Model: Send + Sync {
    /// Run one forward pass, returning the probability vector of the single
    /// batch entry.
    fn forward(&self, input: &ImageTensor) -> Result<Vec<f32>, InferenceError>;

    /// Number of output classes, when the model can report it
    fn num_classes(&self) -> Option<usize> {
        None
    }

    /// Human readable name for logs
    fn name(&self) -> &str;
}

/// ONNX model executed with tract
pub struct TractModel {
    plan: TypedRunnableModel<TypedModel>,
    name: String,
    num_classes: Option<usize>,
}

impl TractModel {
    /// Load, optimize and plan an ONNX classifier expecting NHWC
    /// `[1, 224, 224, 3]` f32 input.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, InferenceError> {
        let path = path.as_ref();
        info!("Loading classification model from {}", path.display());

        let model = tract_onnx::onnx()
            .model_for_path(path)
            .map_err(|e| InferenceError::ModelLoadError(format!("{}: {}", path.display(), e)))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(
                    f32::datum_type(),
                    tvec!(1, INPUT_HEIGHT as usize, INPUT_WIDTH as usize, INPUT_CHANNELS),
                ),
            )
            .map_err(|e| InferenceError::ModelLoadError(e.to_string()))?
            .into_optimized()
            .map_err(|e| InferenceError::ModelLoadError(e.to_string()))?;

        let num_classes = model
            .output_fact(0)
            .ok()
            .and_then(|fact| fact.shape.as_concrete().map(|dims| dims.to_vec()))
            .and_then(|dims| dims.last().copied());
        debug!("Model output classes: {:?}", num_classes);

        let plan = model
            .into_runnable()
            .map_err(|e| InferenceError::ModelLoadError(e.to_string()))?;

        info!("Model loaded successfully");
        Ok(Self {
            plan,
            name: path.display().to_string(),
            num_classes,
        })
    }
}

impl Model for TractModel {
    fn forward(&self, input: &ImageTensor) -> Result<Vec<f32>, InferenceError> {
        let expected = [1, INPUT_HEIGHT as usize, INPUT_WIDTH as usize, INPUT_CHANNELS];
        if input.shape() != expected {
            return Err(InferenceError::InvalidInputShape {
                expected: format!("{:?}", expected),
                actual: format!("{:?}", input.shape()),
            });
        }

        let tensor: Tensor = input.clone().into();
        let outputs = self
            .plan
            .run(tvec!(tensor.into()))
            .map_err(|e| InferenceError::InferenceFailed(e.to_string()))?;

        let output = outputs
            .first()
            .ok_or_else(|| InferenceError::InferenceFailed("model produced no outputs".to_string()))?;
        let view = output
            .to_array_view::<f32>()
            .map_err(|e| InferenceError::InferenceFailed(e.to_string()))?;

        // [1, classes] or [classes]; anything else is not a single batch entry
        match view.shape() {
            [1, _] | [_] => Ok(view.iter().copied().collect()),
            other => Err(InferenceError::InvalidInputShape {
                expected: "[1, classes]".to_string(),
                actual: format!("{:?}", other),
            }),
        }
    }

    fn num_classes(&self) -> Option<usize> {
        self.num_classes
    }

    fn name(&self) -> &str {
        &self.name
    }
}
