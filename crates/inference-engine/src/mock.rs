//! Deterministic stand-in models for development and tests

use tracing::info;

use crate::model::Model;
use crate::preprocess::ImageTensor;
use crate::{InferenceError, INPUT_CHANNELS};

/// Scores each class by the mean intensity of one color channel.
///
/// Class `i` reads channel `i`; probabilities are the channel means divided
/// by their sum, so a reddish image lands on class 0, greenish on class 1
/// and bluish on class 2. An all-black image yields a uniform vector.
#[derive(Debug, Default, Clone, Copy)]
pub struct ChannelMeanModel;

impl ChannelMeanModel {
    pub fn new() -> Self {
        info!("Creating mock channel-mean model");
        Self
    }
}

impl Model for ChannelMeanModel {
    fn forward(&self, input: &ImageTensor) -> Result<Vec<f32>, InferenceError> {
        let shape = input.shape();
        if shape.len() != 4 || shape[0] != 1 || shape[3] != INPUT_CHANNELS {
            return Err(InferenceError::InvalidInputShape {
                expected: format!("[1, H, W, {}]", INPUT_CHANNELS),
                actual: format!("{:?}", shape),
            });
        }

        let pixels = (shape[1] * shape[2]) as f64;
        let mut sums = [0.0f64; INPUT_CHANNELS];
        for (i, value) in input.iter().enumerate() {
            sums[i % INPUT_CHANNELS] += f64::from(*value);
        }

        let means: Vec<f64> = sums.iter().map(|s| s / pixels).collect();
        let total: f64 = means.iter().sum();
        if total == 0.0 {
            return Ok(vec![1.0 / INPUT_CHANNELS as f32; INPUT_CHANNELS]);
        }

        Ok(means.iter().map(|m| (m / total) as f32).collect())
    }

    fn num_classes(&self) -> Option<usize> {
        Some(INPUT_CHANNELS)
    }

    fn name(&self) -> &str {
        "mock:channel-mean"
    }
}

/// Returns the same output vector for every input
#[derive(Debug, Clone)]
pub struct FixedOutputModel {
    output: Vec<f32>,
    report_classes: bool,
}

impl FixedOutputModel {
    pub fn new(output: Vec<f32>) -> Self {
        Self {
            output,
            report_classes: true,
        }
    }

    /// Do not report a class count, mimicking graphs with symbolic outputs
    pub fn without_class_hint(mut self) -> Self {
        self.report_classes = false;
        self
    }
}

impl Model for FixedOutputModel {
    fn forward(&self, _input: &ImageTensor) -> Result<Vec<f32>, InferenceError> {
        Ok(self.output.clone())
    }

    fn num_classes(&self) -> Option<usize> {
        self.report_classes.then_some(self.output.len())
    }

    fn name(&self) -> &str {
        "mock:fixed-output"
    }
}
