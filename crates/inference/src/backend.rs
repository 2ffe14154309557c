//! [`InferenceBackend`] over the inference server's HTTP API.

use async_trait::async_trait;
use vocalis_core::inference::{
    ClassificationRequest, InferenceBackend, InferenceError, TranscriptionRequest,
};

use crate::api::{InferenceApi, InferenceApiError};

/// Speech model used when `STT_MODEL` is not set.
pub const DEFAULT_STT_MODEL: &str = "medium";

/// Emotion classifier used when `SA_MODEL` is not set.
pub const DEFAULT_SA_MODEL: &str = "xmj2002/hubert-base-ch-speech-emotion-recognition";

/// Where the inference server lives and which models to ask it for.
#[derive(Debug, Clone)]
pub struct InferenceConfig {
    pub base_url: String,
    pub stt_model: String,
    pub sa_model: String,
}

impl InferenceConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            stt_model: DEFAULT_STT_MODEL.to_string(),
            sa_model: DEFAULT_SA_MODEL.to_string(),
        }
    }
}

pub struct HttpInferenceBackend {
    api: InferenceApi,
    stt_model: String,
    sa_model: String,
}

impl HttpInferenceBackend {
    pub fn new(config: InferenceConfig) -> Self {
        Self {
            api: InferenceApi::new(config.base_url),
            stt_model: config.stt_model,
            sa_model: config.sa_model,
        }
    }
}

impl From<InferenceApiError> for InferenceError {
    fn from(err: InferenceApiError) -> Self {
        match err {
            InferenceApiError::ApiError { status, body } => Self::Server { status, body },
            InferenceApiError::Request(e) if e.is_decode() => Self::Malformed(e.to_string()),
            InferenceApiError::Request(e) => Self::Transport(e.to_string()),
        }
    }
}

#[async_trait]
impl InferenceBackend for HttpInferenceBackend {
    async fn transcribe(&self, request: &TranscriptionRequest) -> Result<String, InferenceError> {
        tracing::debug!(
            model = %self.stt_model,
            language = %request.language,
            bytes = request.audio.len(),
            "Requesting transcription",
        );
        let response = self
            .api
            .transcribe(&request.audio, &request.language, &self.stt_model)
            .await?;
        Ok(response.text)
    }

    async fn classify(&self, request: &ClassificationRequest) -> Result<Vec<f32>, InferenceError> {
        tracing::debug!(
            model = %self.sa_model,
            sample_rate = request.sample_rate,
            bytes = request.audio.len(),
            "Requesting emotion classification",
        );
        let response = self
            .api
            .classify(
                &request.audio,
                request.sample_rate,
                request.max_duration_secs,
                &self.sa_model,
            )
            .await?;
        Ok(response.logits)
    }
}
