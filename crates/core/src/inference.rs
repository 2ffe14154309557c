//! Seam between capability handlers and the models that do the numerics.
//!
//! Speech transcription and emotion classification run on an external
//! inference server; handlers only see [`InferenceBackend`]. The HTTP client
//! lives in the `vocalis-inference` crate.

use async_trait::async_trait;

use crate::audio::AudioClip;

/// Input for a transcription call.
#[derive(Debug, Clone)]
pub struct TranscriptionRequest {
    pub audio: AudioClip,
    /// Spoken language hint (ISO 639-1, e.g. `"id"`).
    pub language: String,
}

/// Input for an emotion classification call.
#[derive(Debug, Clone)]
pub struct ClassificationRequest {
    pub audio: AudioClip,
    /// Sample rate the classifier expects the clip to be resampled to.
    pub sample_rate: u32,
    /// The clip is padded or truncated to this many seconds.
    pub max_duration_secs: u32,
}

/// Errors from an inference backend.
#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    /// The request never reached the server or the connection dropped.
    #[error("inference request failed: {0}")]
    Transport(String),

    /// The server answered with a non-2xx status.
    #[error("inference server error ({status}): {body}")]
    Server { status: u16, body: String },

    /// The server answered 2xx but the body was not what we expected.
    #[error("malformed inference response: {0}")]
    Malformed(String),
}

/// Model-serving backend used by the built-in capabilities.
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Transcribe speech, returning the raw text as produced by the model.
    async fn transcribe(&self, request: &TranscriptionRequest) -> Result<String, InferenceError>;

    /// Classify the clip's emotion, returning one raw logit per class.
    async fn classify(&self, request: &ClassificationRequest) -> Result<Vec<f32>, InferenceError>;
}
