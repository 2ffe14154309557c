//! REST API client for the inference server endpoints.
//!
//! Wraps `POST /transcribe` and `POST /classify` using [`reqwest`]
//! multipart uploads.

use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use vocalis_core::audio::AudioClip;

/// HTTP client for a single inference server.
pub struct InferenceApi {
    client: reqwest::Client,
    api_url: String,
}

/// Response of `POST /transcribe`.
#[derive(Debug, Deserialize)]
pub struct TranscribeResponse {
    pub text: String,
}

/// Response of `POST /classify`: one logit per emotion class.
#[derive(Debug, Deserialize)]
pub struct ClassifyResponse {
    pub logits: Vec<f32>,
}

/// Errors from the inference REST API layer.
#[derive(Debug, thiserror::Error)]
pub enum InferenceApiError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server returned a non-2xx status code.
    #[error("Inference API error ({status}): {body}")]
    ApiError { status: u16, body: String },
}

impl InferenceApi {
    /// * `api_url` - Base HTTP URL, e.g. `http://host:8000`. A trailing
    ///   slash is ignored.
    pub fn new(api_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), api_url)
    }

    /// Create an API client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, api_url: impl Into<String>) -> Self {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        Self { client, api_url }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Transcribe a clip with the named speech model.
    pub async fn transcribe(
        &self,
        audio: &AudioClip,
        language: &str,
        model: &str,
    ) -> Result<TranscribeResponse, InferenceApiError> {
        let form = Form::new()
            .part("file", audio_part(audio)?)
            .text("language", language.to_string())
            .text("model", model.to_string());

        let response = self
            .client
            .post(format!("{}/transcribe", self.api_url))
            .multipart(form)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Classify the emotion of a clip with the named classifier.
    pub async fn classify(
        &self,
        audio: &AudioClip,
        sample_rate: u32,
        max_duration_secs: u32,
        model: &str,
    ) -> Result<ClassifyResponse, InferenceApiError> {
        let form = Form::new()
            .part("file", audio_part(audio)?)
            .text("sample_rate", sample_rate.to_string())
            .text("max_duration_secs", max_duration_secs.to_string())
            .text("model", model.to_string());

        let response = self
            .client
            .post(format!("{}/classify", self.api_url))
            .multipart(form)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or an [`InferenceApiError::ApiError`]
    /// containing the status and body text on failure.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, InferenceApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(InferenceApiError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, InferenceApiError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

fn audio_part(audio: &AudioClip) -> Result<Part, InferenceApiError> {
    let part = Part::bytes(audio.data.to_vec()).file_name(audio.upload_name());
    match audio.format {
        Some(format) => Ok(part.mime_str(format.mime_type())?),
        None => Ok(part),
    }
}
