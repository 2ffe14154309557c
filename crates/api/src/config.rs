use vocalis_core::registry::DEFAULT_MODEL_CONFIG_PATH;
use vocalis_inference::backend::{DEFAULT_SA_MODEL, DEFAULT_STT_MODEL};
use vocalis_inference::InferenceConfig;
use vocalis_worker::engine::{DEFAULT_CONCURRENCY, DEFAULT_QUEUE_CAPACITY};
use vocalis_worker::EngineConfig;

use crate::auth::jwt::JwtConfig;

/// Default upload limit for inference submissions (25 MiB).
const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have defaults suitable for local
/// development. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long shutdown waits for running jobs, in seconds (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Request body limit for uploads.
    pub max_upload_bytes: usize,
    /// Path of the model config YAML.
    pub model_config_path: String,
    pub inference: InferenceConfig,
    pub engine: EngineConfig,
    /// JWT token configuration.
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                     |
    /// |-------------------------|-----------------------------|
    /// | `HOST`                  | `0.0.0.0`                   |
    /// | `PORT`                  | `3000`                      |
    /// | `CORS_ORIGINS`          | `http://localhost:5173`     |
    /// | `REQUEST_TIMEOUT_SECS`  | `30`                        |
    /// | `SHUTDOWN_TIMEOUT_SECS` | `30`                        |
    /// | `MAX_UPLOAD_BYTES`      | `26214400`                  |
    /// | `MODEL_CONFIG_PATH`     | `config/config_model.yaml`  |
    /// | `INFERENCE_URL`         | `http://localhost:8000`     |
    /// | `STT_MODEL`             | `medium`                    |
    /// | `SA_MODEL`              | `xmj2002/hubert-base-ch-speech-emotion-recognition` |
    /// | `WORKER_CONCURRENCY`    | `2`                         |
    /// | `WORKER_QUEUE_CAPACITY` | `64`                        |
    ///
    /// `DATABASE_URL` is read separately by the binary.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let max_upload_bytes: usize = std::env::var("MAX_UPLOAD_BYTES")
            .unwrap_or_else(|_| DEFAULT_MAX_UPLOAD_BYTES.to_string())
            .parse()
            .expect("MAX_UPLOAD_BYTES must be a valid usize");

        let model_config_path = std::env::var("MODEL_CONFIG_PATH")
            .unwrap_or_else(|_| DEFAULT_MODEL_CONFIG_PATH.into());

        let inference = InferenceConfig {
            base_url: std::env::var("INFERENCE_URL")
                .unwrap_or_else(|_| "http://localhost:8000".into()),
            stt_model: std::env::var("STT_MODEL").unwrap_or_else(|_| DEFAULT_STT_MODEL.into()),
            sa_model: std::env::var("SA_MODEL").unwrap_or_else(|_| DEFAULT_SA_MODEL.into()),
        };

        let engine = EngineConfig {
            concurrency: std::env::var("WORKER_CONCURRENCY")
                .unwrap_or_else(|_| DEFAULT_CONCURRENCY.to_string())
                .parse()
                .expect("WORKER_CONCURRENCY must be a valid usize"),
            queue_capacity: std::env::var("WORKER_QUEUE_CAPACITY")
                .unwrap_or_else(|_| DEFAULT_QUEUE_CAPACITY.to_string())
                .parse()
                .expect("WORKER_QUEUE_CAPACITY must be a valid usize"),
        };

        let jwt = JwtConfig::from_env();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            max_upload_bytes,
            model_config_path,
            inference,
            engine,
            jwt,
        }
    }
}
