//! Shared helpers for router tests

use axum::{
    body::{to_bytes, Body},
    http::{header, Request},
    response::Response,
    Router,
};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use inference_engine::{ChannelMeanModel, ImageTensor, InferenceEngine, InferenceError, Model};
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::{create_router, AppState};

const BOUNDARY: &str = "----tomato-test-boundary";

pub fn router() -> Router {
    router_with(InferenceEngine::mock())
}

pub fn router_with(engine: InferenceEngine) -> Router {
    create_router(Arc::new(AppState::new(engine)), 1024 * 1024)
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn solid_png(w: u32, h: u32, rgb: [u8; 3]) -> Vec<u8> {
    let img = RgbImage::from_pixel(w, h, Rgb(rgb));
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}

/// Build a multipart/form-data POST to `/predict` with one field
pub fn upload(field: &str, content_type: Option<&str>, data: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"leaf.bin\"\r\n",
            field
        )
        .as_bytes(),
    );
    if let Some(ct) = content_type {
        body.extend_from_slice(format!("Content-Type: {}\r\n", ct).as_bytes());
    }
    body.extend_from_slice(b"\r\n");
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

    Request::post("/predict")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

/// Channel-mean model that counts forward passes
#[derive(Default)]
pub struct CountingModel {
    pub calls: AtomicUsize,
}

impl CountingModel {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Model for CountingModel {
    fn forward(&self, input: &ImageTensor) -> Result<Vec<f32>, InferenceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        ChannelMeanModel.forward(input)
    }

    fn num_classes(&self) -> Option<usize> {
        Some(3)
    }

    fn name(&self) -> &str {
        "test:counting"
    }
}

/// Model whose forward pass always fails
pub struct FailingModel;

impl Model for FailingModel {
    fn forward(&self, _input: &ImageTensor) -> Result<Vec<f32>, InferenceError> {
        Err(InferenceError::InferenceFailed("runtime exploded".to_string()))
    }

    fn name(&self) -> &str {
        "test:failing"
    }
}
