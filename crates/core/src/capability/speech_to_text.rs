//! Speech transcription capability (`speech_to_text`, table `stt_result`).

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;

use super::params::{PARAM_AUDIO_CONTENTS, PARAM_AUDIO_FORMAT, PARAM_LANGUAGE};
use super::{
    audio_minutes, elapsed_minutes, take_audio, CapabilityContext, CapabilityError,
    CapabilityHandler, CapabilityParams, ConstructionError, JobContext,
};
use crate::audio::AudioClip;
use crate::inference::{InferenceBackend, TranscriptionRequest};
use crate::results::{ResultRow, SttResult};

/// Language used when the submission does not name one.
pub const DEFAULT_LANGUAGE: &str = "id";

pub(super) const PARAMETERS: &[&str] = &[PARAM_AUDIO_CONTENTS, PARAM_AUDIO_FORMAT, PARAM_LANGUAGE];

/// Transcribes one uploaded clip.
pub struct SpeechToText {
    audio: AudioClip,
    language: String,
    backend: Arc<dyn InferenceBackend>,
}

pub(super) fn build(
    mut params: CapabilityParams,
    ctx: &CapabilityContext,
) -> Result<Box<dyn CapabilityHandler>, ConstructionError> {
    let audio = take_audio(&mut params)?;
    let language = params
        .take_text(PARAM_LANGUAGE)?
        .map(|l| l.trim().to_ascii_lowercase())
        .filter(|l| !l.is_empty())
        .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());

    Ok(Box::new(SpeechToText {
        audio,
        language,
        backend: Arc::clone(&ctx.backend),
    }))
}

/// Collapse whitespace, strip apostrophes and wrap the text in braces,
/// which is the stored form of `stt_result.transcription`.
pub fn normalize_transcription(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    format!("{{{}}}", collapsed.replace('\'', ""))
}

#[async_trait]
impl CapabilityHandler for SpeechToText {
    async fn execute(&self, job: &JobContext) -> Result<ResultRow, CapabilityError> {
        let started = Instant::now();
        let start_time = Utc::now();

        let raw = self
            .backend
            .transcribe(&TranscriptionRequest {
                audio: self.audio.clone(),
                language: self.language.clone(),
            })
            .await?;
        let audio_duration = audio_minutes(&self.audio).await?;
        let finish_time = Utc::now();

        tracing::debug!(
            job_id = job.job_id,
            language = %self.language,
            audio_duration,
            "Transcription finished",
        );

        Ok(ResultRow::Stt(SttResult {
            job_id: job.job_id,
            model_id: job.model_id,
            correlation_id: job.correlation_id.clone(),
            transcription: normalize_transcription(&raw),
            audio_duration,
            start_time,
            finish_time,
            stt_duration: elapsed_minutes(started),
            inserted_at: Utc::now(),
        }))
    }
}
