//! Speech emotion classification capability (`stress_analysis`, table
//! `sa_result`).
//!
//! The backend returns one logit per class; softmax, arg-max and the label
//! mapping happen here so that every backend agrees on the class order.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;

use super::params::{PARAM_AUDIO_CONTENTS, PARAM_AUDIO_FORMAT};
use super::{
    audio_minutes, elapsed_minutes, round2, take_audio, CapabilityContext, CapabilityError,
    CapabilityHandler, CapabilityParams, ConstructionError, JobContext,
};
use crate::audio::AudioClip;
use crate::inference::{ClassificationRequest, InferenceBackend};
use crate::results::{ResultRow, SaResult};

/// Sample rate of the emotion model's feature extractor.
pub const SAMPLE_RATE: u32 = 16_000;

/// Clips are padded or truncated to this length before classification.
pub const MAX_CLIP_SECS: u32 = 15;

/// Class labels in model output order. Indices past the end map to the
/// last label.
pub const EMOTION_LABELS: [&str; 6] = ["angry", "fear", "happy", "neutral", "sadness", "excited"];

pub(super) const PARAMETERS: &[&str] = &[PARAM_AUDIO_CONTENTS, PARAM_AUDIO_FORMAT];

/// Classifies the emotion of one uploaded clip.
pub struct StressAnalysis {
    audio: AudioClip,
    backend: Arc<dyn InferenceBackend>,
}

pub(super) fn build(
    mut params: CapabilityParams,
    ctx: &CapabilityContext,
) -> Result<Box<dyn CapabilityHandler>, ConstructionError> {
    let audio = take_audio(&mut params)?;
    Ok(Box::new(StressAnalysis {
        audio,
        backend: Arc::clone(&ctx.backend),
    }))
}

pub fn emotion_label(index: usize) -> &'static str {
    EMOTION_LABELS
        .get(index)
        .copied()
        .unwrap_or(EMOTION_LABELS[EMOTION_LABELS.len() - 1])
}

/// Numerically stable softmax.
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|l| (l - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// Winning label and its probability, or `None` for empty or non-finite
/// output.
pub fn classify(logits: &[f32]) -> Option<(&'static str, f32)> {
    if logits.is_empty() || logits.iter().any(|l| !l.is_finite()) {
        return None;
    }
    let probs = softmax(logits);
    let (index, prob) = probs
        .iter()
        .copied()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(&b.1))?;
    Some((emotion_label(index), prob))
}

#[async_trait]
impl CapabilityHandler for StressAnalysis {
    async fn execute(&self, job: &JobContext) -> Result<ResultRow, CapabilityError> {
        let started = Instant::now();
        let start_time = Utc::now();

        let logits = self
            .backend
            .classify(&ClassificationRequest {
                audio: self.audio.clone(),
                sample_rate: SAMPLE_RATE,
                max_duration_secs: MAX_CLIP_SECS,
            })
            .await?;

        let (emotion, confidence) = classify(&logits).ok_or_else(|| {
            CapabilityError::Output(format!(
                "classifier returned {} unusable logits",
                logits.len()
            ))
        })?;

        let audio_duration = audio_minutes(&self.audio).await?;
        let finish_time = Utc::now();

        Ok(ResultRow::Sa(SaResult {
            job_id: job.job_id,
            model_id: job.model_id,
            correlation_id: job.correlation_id.clone(),
            emotion_result: emotion.to_string(),
            confidence_value: round2(f64::from(confidence)),
            audio_duration,
            start_time,
            finish_time,
            sa_duration: elapsed_minutes(started),
            inserted_at: Utc::now(),
        }))
    }
}
