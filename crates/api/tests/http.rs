//! End-to-end tests against a real listener

use std::io::Cursor;
use std::net::SocketAddr;
use std::sync::Arc;

use api::{create_router, AppState, PING_MESSAGE};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use inference_engine::InferenceEngine;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;

async fn spawn_server() -> SocketAddr {
    let state = Arc::new(AppState::new(InferenceEngine::mock()));
    let app = create_router(state, 4 * 1024 * 1024);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn png(w: u32, h: u32, rgb: [u8; 3]) -> Vec<u8> {
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, Rgb(rgb)))
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}

fn form(bytes: Vec<u8>, mime: &str) -> Form {
    let part = Part::bytes(bytes)
        .file_name("leaf.png")
        .mime_str(mime)
        .unwrap();
    Form::new().part("file", part)
}

#[tokio::test]
async fn test_ping_over_http() {
    let addr = spawn_server().await;

    let response = reqwest::get(format!("http://{}/ping", addr)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json: serde_json::Value = response.json().await.unwrap();
    assert_eq!(json["message"], PING_MESSAGE);
}

#[tokio::test]
async fn test_predict_over_http() {
    let addr = spawn_server().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("http://{}/predict", addr))
        .multipart(form(png(10, 10, [200, 30, 30]), "image/png"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json: serde_json::Value = response.json().await.unwrap();
    assert_eq!(json["class"], "Healthy");
    assert!((json["confidence"].as_f64().unwrap() - 200.0 / 260.0).abs() < 1e-6);
}

#[tokio::test]
async fn test_text_plain_rejected_over_http() {
    let addr = spawn_server().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("http://{}/predict", addr))
        .multipart(form(b"just text".to_vec(), "text/plain"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json: serde_json::Value = response.json().await.unwrap();
    assert_eq!(json["detail"], "File must be an image");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_fifty_concurrent_uploads() {
    let addr = spawn_server().await;
    let client = reqwest::Client::new();
    let colors: [([u8; 3], &str); 3] = [
        ([250, 5, 5], "Healthy"),
        ([5, 250, 5], "Late_Blight"),
        ([5, 5, 250], "Early_Blight"),
    ];

    let mut handles = Vec::new();
    for i in 0..50 {
        let client = client.clone();
        let (rgb, expected) = colors[i % colors.len()];
        let url = format!("http://{}/predict", addr);
        handles.push(tokio::spawn(async move {
            let response = client
                .post(url)
                .multipart(form(png(16 + i as u32, 9, rgb), "image/png"))
                .send()
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            let json: serde_json::Value = response.json().await.unwrap();
            (expected, json)
        }));
    }

    for handle in handles {
        let (expected, json) = handle.await.unwrap();
        assert_eq!(json["class"], expected);
        let confidence = json["confidence"].as_f64().unwrap();
        assert!((confidence - 250.0 / 260.0).abs() < 1e-6);
    }
}
