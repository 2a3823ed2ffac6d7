//! Image decoding and model input preparation

use image::imageops::FilterType;
use image::RgbImage;
use tract_core::ndarray::Array4;

use crate::{InferenceError, INPUT_CHANNELS, INPUT_HEIGHT, INPUT_WIDTH};

/// Batched NHWC input tensor: `[1, INPUT_HEIGHT, INPUT_WIDTH, 3]`
pub type ImageTensor = Array4<f32>;

/// Resampling filter used to stretch uploads to the input size (bicubic)
pub const RESIZE_FILTER: FilterType = FilterType::CatmullRom;

/// Decode arbitrary image bytes into 8-bit RGB.
///
/// Grayscale, alpha and palette images are all converted to three channels.
/// The format is guessed from the content, not from any declared type.
pub fn decode_image(bytes: &[u8]) -> Result<RgbImage, InferenceError> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| InferenceError::InvalidImage(e.to_string()))?;

    if img.width() == 0 || img.height() == 0 {
        return Err(InferenceError::InvalidImage(format!(
            "image has zero area ({}x{})",
            img.width(),
            img.height()
        )));
    }

    Ok(img.to_rgb8())
}

/// Stretch an image to the model input size (no crop, no letterbox)
pub fn resize_to_input(img: &RgbImage) -> RgbImage {
    if img.width() == INPUT_WIDTH && img.height() == INPUT_HEIGHT {
        return img.clone();
    }
    image::imageops::resize(img, INPUT_WIDTH, INPUT_HEIGHT, RESIZE_FILTER)
}

/// Build the batched input tensor.
///
/// Pixel values keep their native 0..=255 range; the model applies its own
/// rescaling.
pub fn to_input_tensor(img: &RgbImage) -> Result<ImageTensor, InferenceError> {
    let (width, height) = img.dimensions();
    let data: Vec<f32> = img.as_raw().iter().map(|&v| f32::from(v)).collect();

    Array4::from_shape_vec(
        (1, height as usize, width as usize, INPUT_CHANNELS),
        data,
    )
    .map_err(|e| InferenceError::InvalidInputShape {
        expected: format!("[1, {}, {}, {}]", height, width, INPUT_CHANNELS),
        actual: e.to_string(),
    })
}

/// Decode, resize and batch uploaded bytes in one step
pub fn prepare(bytes: &[u8]) -> Result<ImageTensor, InferenceError> {
    let decoded = decode_image(bytes)?;
    let resized = resize_to_input(&decoded);
    to_input_tensor(&resized)
}
