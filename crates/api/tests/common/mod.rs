//! Shared fixtures for HTTP-level tests.
//!
//! The app is built with the production router and middleware stack over an
//! in-memory store, the shipped model config and a stub inference backend,
//! so no database or model server is needed.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use jsonwebtoken::{encode, EncodingKey, Header};
use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;
use vocalis_core::capability::CapabilityContext;
use vocalis_core::inference::{
    ClassificationRequest, InferenceBackend, InferenceError, TranscriptionRequest,
};
use vocalis_core::registry::CapabilityRegistry;
use vocalis_core::resolver::CapabilityResolver;
use vocalis_core::store::{MemoryStore, Store};
use vocalis_inference::InferenceConfig;
use vocalis_worker::{EngineConfig, ExecutionEngine, JobExecutor};

use vocalis_api::auth::jwt::JwtConfig;
use vocalis_api::config::ServerConfig;
use vocalis_api::router::build_app_router;
use vocalis_api::state::AppState;

/// The model config shipped with the repository.
pub const MODEL_CONFIG: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../config/config_model.yaml");

/// Returns a fixed transcription and logits favouring "neutral".
pub struct StubBackend;

#[async_trait]
impl InferenceBackend for StubBackend {
    async fn transcribe(&self, _req: &TranscriptionRequest) -> Result<String, InferenceError> {
        Ok("  it's   a test ".into())
    }

    async fn classify(&self, _req: &ClassificationRequest) -> Result<Vec<f32>, InferenceError> {
        Ok(vec![0.1, 0.2, 0.3, 3.0, 0.2, 0.1])
    }
}

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        max_upload_bytes: 1024 * 1024,
        model_config_path: MODEL_CONFIG.to_string(),
        inference: InferenceConfig::new("http://127.0.0.1:9"),
        engine: EngineConfig::default(),
        jwt: JwtConfig {
            secret: "test-secret-for-vocalis".to_string(),
        },
    }
}

/// A running app plus handles into its state.
pub struct TestApp {
    pub router: Router,
    pub store: MemoryStore,
    pub config: ServerConfig,
    pub cancel: CancellationToken,
}

impl TestApp {
    /// A valid Bearer token for user 1.
    pub fn token(&self) -> String {
        issue_token(&self.config.jwt, 1, "tester")
    }

    pub fn app(&self) -> Router {
        self.router.clone()
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Sign a token shaped like the auth service's: `{username, id, exp}`.
pub fn issue_token(jwt: &JwtConfig, id: i64, username: &str) -> String {
    let exp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64
        + 600;
    encode(
        &Header::default(),
        &serde_json::json!({ "username": username, "id": id, "exp": exp }),
        &EncodingKey::from_secret(jwt.secret.as_bytes()),
    )
    .unwrap()
}

/// Build the full application router with the production middleware stack.
pub fn build_test_app() -> TestApp {
    build_test_app_with(test_config())
}

pub fn build_test_app_with(config: ServerConfig) -> TestApp {
    let registry = CapabilityRegistry::load(&config.model_config_path).unwrap();
    let resolver = Arc::new(CapabilityResolver::new(Arc::new(registry)));

    let memory = MemoryStore::new();
    let store: Arc<dyn Store> = Arc::new(memory.clone());

    let executor = Arc::new(JobExecutor::new(
        Arc::clone(&store),
        Arc::clone(&resolver),
        CapabilityContext::new(Arc::new(StubBackend)),
    ));
    let cancel = CancellationToken::new();
    let (engine, _handle) = ExecutionEngine::start(executor, config.engine, cancel.clone());

    let state = AppState {
        store,
        config: Arc::new(config.clone()),
        resolver,
        engine,
    };

    TestApp {
        router: build_app_router(state, &config),
        store: memory,
        config,
        cancel,
    }
}

/// One second of 16 kHz mono silence as a WAV file.
pub fn wav_bytes() -> Vec<u8> {
    vocalis_core::audio::silent_wav(16_000, 16_000)
}

const BOUNDARY: &str = "vocalis-test-boundary";

/// Hand-built `multipart/form-data` body.
#[derive(Default)]
pub struct MultipartBody {
    body: Vec<u8>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, data: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn finish(mut self) -> Vec<u8> {
        self.body
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        self.body
    }
}

/// The usual inference form: a wav upload, `explaining=true` and a
/// correlation id.
pub fn inference_form(correlation_id: &str) -> MultipartBody {
    MultipartBody::new()
        .file("data", "sample.wav", &wav_bytes())
        .text("explaining", "true")
        .text("correlation_id", correlation_id)
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_multipart_auth(
    app: Router,
    uri: &str,
    form: MultipartBody,
    token: &str,
) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(form.finish()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Register `name` and return its id.
pub async fn register_model(app: &TestApp, name: &str) -> i64 {
    let response = post_json_auth(
        app.app(),
        "/api/v1/models/regis_model",
        serde_json::json!({ "ml_model_name": name }),
        &app.token(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["id"].as_i64().unwrap()
}

/// Poll `/responses` until every job for the correlation id is complete.
pub async fn wait_for_completion(app: &TestApp, model_id: i64, correlation_id: &str) -> serde_json::Value {
    let uri = format!("/api/v1/models/{model_id}/responses?type=inference&correlation_id={correlation_id}");
    for _ in 0..200 {
        let response = get_auth(app.app(), &uri, &app.token()).await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let jobs = json.as_array().unwrap();
        if !jobs.is_empty() && jobs.iter().all(|j| j["progress"]["complete"] == true) {
            return json;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("jobs for {correlation_id} did not complete");
}
