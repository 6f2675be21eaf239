//! Shared helpers for API integration tests.
//!
//! Provides a stub [`GenerationService`] with instant canned results, a
//! test router built through the same [`build_app_router`] the binary
//! uses, and small request/response helpers.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{Method, Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use storyreel_api::config::ServerConfig;
use storyreel_api::router::build_app_router;
use storyreel_api::state::AppState;
use storyreel_core::{GenerationError, GenerationService, ImagePayload, Scene, VideoPayload};
use storyreel_events::RunBus;
use storyreel_pipeline::RunRegistry;

/// Multipart boundary used by [`MultipartBuilder`].
pub const BOUNDARY: &str = "X-STORYREEL-TEST-BOUNDARY";

// ---------------------------------------------------------------------------
// Stub generation service
// ---------------------------------------------------------------------------

/// Generation service returning instant canned results, so integration
/// tests can drive a run to completion without any network access.
pub struct StubService;

#[async_trait]
impl GenerationService for StubService {
    async fn describe_image(&self, _image: &ImagePayload) -> Result<String, GenerationError> {
        Ok("a grey tabby cat with green eyes".to_string())
    }

    async fn generate_script(
        &self,
        _idea: &str,
        _character_notes: &str,
    ) -> Result<Vec<Scene>, GenerationError> {
        Ok((1..=3)
            .map(|n| Scene {
                scene_number: n,
                description: format!("Scene {n} description"),
                video_prompt: format!("scene {n} prompt"),
            })
            .collect())
    }

    async fn generate_still_image(&self, _prompt: &str) -> Result<ImagePayload, GenerationError> {
        Ok(ImagePayload {
            mime_type: "image/png".to_string(),
            bytes: png_bytes(),
        })
    }

    async fn generate_video(
        &self,
        prompt: &str,
        _seed_image: &ImagePayload,
    ) -> Result<VideoPayload, GenerationError> {
        // Echo the prompt so tests can tell clips apart.
        Ok(VideoPayload {
            mime_type: "video/mp4".to_string(),
            bytes: prompt.as_bytes().to_vec(),
        })
    }
}

// ---------------------------------------------------------------------------
// App construction
// ---------------------------------------------------------------------------

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
    }
}

/// Build the full application router backed by [`StubService`].
///
/// Goes through [`build_app_router`] so integration tests exercise the
/// same middleware stack (CORS, request ID, timeout, tracing, panic
/// recovery) that production uses.
pub fn build_test_app() -> Router {
    let config = test_config();
    let state = AppState {
        config: Arc::new(config.clone()),
        registry: Arc::new(RunRegistry::new()),
        bus: Arc::new(RunBus::default()),
        service: Arc::new(StubService),
    };
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

/// Issue a GET request against the app.
pub async fn get(app: Router, uri: &str) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

/// Issue a multipart POST request against the app.
pub async fn post_multipart(app: Router, uri: &str, body: Vec<u8>) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(
                CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap(),
    )
    .await
    .unwrap()
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Collect a response body as raw bytes.
pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

/// Assert a response has the given status; on mismatch, include the body
/// in the panic message for easier debugging.
pub async fn assert_status(response: Response<Body>, expected: StatusCode) -> serde_json::Value {
    let status = response.status();
    let json = body_json(response).await;
    assert_eq!(status, expected, "unexpected status, body: {json}");
    json
}

// ---------------------------------------------------------------------------
// Multipart body builder
// ---------------------------------------------------------------------------

/// Builds `multipart/form-data` request bodies with [`BOUNDARY`].
#[derive(Default)]
pub struct MultipartBuilder {
    body: Vec<u8>,
}

impl MultipartBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a text field.
    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    /// Append a file field with raw bytes.
    pub fn file(mut self, name: &str, filename: &str, content_type: &str, bytes: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; \
                 filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(bytes);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    /// Finish the body with the closing boundary.
    pub fn build(mut self) -> Vec<u8> {
        self.body
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        self.body
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Minimal PNG magic bytes plus filler; enough for format sniffing.
pub fn png_bytes() -> Vec<u8> {
    let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    bytes.extend_from_slice(&[0u8; 64]);
    bytes
}
