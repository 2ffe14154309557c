//! Capabilities: pluggable units of audio processing.
//!
//! [`CapabilityKind`] is the compiled dispatch table. Each tag maps to a
//! handler factory, the typed result table the handler writes, and the
//! parameter names the handler understands. Descriptors in the model
//! config name a tag; nothing is looked up by string at execution time.

pub mod params;
pub mod speech_to_text;
pub mod stress_analysis;

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::audio::{AudioClip, AudioError, AudioFormat};
use crate::inference::{InferenceBackend, InferenceError};
use crate::results::{ResultRow, ResultTable};
use crate::types::DbId;

pub use params::{CapabilityParams, ParamValue};

use params::{PARAM_AUDIO_CONTENTS, PARAM_AUDIO_FORMAT};

/// Identity of the job a handler runs for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobContext {
    pub job_id: DbId,
    pub model_id: DbId,
    pub correlation_id: String,
}

/// Shared collaborators available to every factory.
#[derive(Clone)]
pub struct CapabilityContext {
    pub backend: Arc<dyn InferenceBackend>,
}

impl CapabilityContext {
    pub fn new(backend: Arc<dyn InferenceBackend>) -> Self {
        Self { backend }
    }
}

/// Raised while building a handler from its parameters.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConstructionError {
    #[error("missing required parameter '{0}'")]
    MissingParameter(&'static str),

    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

/// Raised while a handler executes.
#[derive(Debug, thiserror::Error)]
pub enum CapabilityError {
    #[error("audio processing failed: {0}")]
    Audio(#[from] AudioError),

    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error("unusable model output: {0}")]
    Output(String),
}

/// The uniform interface the Execution Engine drives.
///
/// A handler is built fresh for one job, runs once, and returns the row
/// for its capability's table. It never writes to the store itself.
#[async_trait]
pub trait CapabilityHandler: Send + Sync {
    async fn execute(&self, job: &JobContext) -> Result<ResultRow, CapabilityError>;
}

/// Builds a bound handler from already-filtered parameters.
pub type HandlerFactory =
    fn(CapabilityParams, &CapabilityContext) -> Result<Box<dyn CapabilityHandler>, ConstructionError>;

/// Capability tags accepted in the model config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityKind {
    SpeechToText,
    StressAnalysis,
}

impl CapabilityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SpeechToText => "speech_to_text",
            Self::StressAnalysis => "stress_analysis",
        }
    }

    /// The table this capability's rows go to.
    pub fn result_table(self) -> ResultTable {
        match self {
            Self::SpeechToText => ResultTable::Stt,
            Self::StressAnalysis => ResultTable::Sa,
        }
    }

    /// Every parameter name the factory reads.
    pub fn parameters(self) -> &'static [&'static str] {
        match self {
            Self::SpeechToText => speech_to_text::PARAMETERS,
            Self::StressAnalysis => stress_analysis::PARAMETERS,
        }
    }

    pub fn factory(self) -> HandlerFactory {
        match self {
            Self::SpeechToText => speech_to_text::build,
            Self::StressAnalysis => stress_analysis::build,
        }
    }
}

impl std::fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pull the upload out of `params`: `audio_contents` is required,
/// `audio_format` is an optional container hint.
pub(crate) fn take_audio(params: &mut CapabilityParams) -> Result<AudioClip, ConstructionError> {
    let data = params.take_bytes(PARAM_AUDIO_CONTENTS)?;
    if data.is_empty() {
        return Err(ConstructionError::InvalidParameter {
            name: PARAM_AUDIO_CONTENTS,
            reason: "audio is empty".into(),
        });
    }

    let format = match params.take_text(PARAM_AUDIO_FORMAT)? {
        Some(value) => Some(AudioFormat::parse(&value).ok_or_else(|| {
            ConstructionError::InvalidParameter {
                name: PARAM_AUDIO_FORMAT,
                reason: format!("unsupported format '{value}'"),
            }
        })?),
        None => None,
    };

    Ok(AudioClip { data, format })
}

/// Audio duration in minutes, measured off the async runtime.
pub(crate) async fn audio_minutes(audio: &AudioClip) -> Result<f64, CapabilityError> {
    let clip = audio.clone();
    let secs = tokio::task::spawn_blocking(move || clip.duration_secs())
        .await
        .map_err(|e| AudioError::Read(format!("duration task failed: {e}")))??;
    Ok(round2(secs / 60.0))
}

/// Minutes elapsed since `started`, two decimals.
pub(crate) fn elapsed_minutes(started: Instant) -> f64 {
    round2(started.elapsed().as_secs_f64() / 60.0)
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_map_to_their_tables() {
        assert_eq!(CapabilityKind::SpeechToText.result_table(), ResultTable::Stt);
        assert_eq!(CapabilityKind::StressAnalysis.result_table(), ResultTable::Sa);
    }

    #[test]
    fn kind_tags_round_trip_through_serde() {
        let kind: CapabilityKind = serde_json::from_str("\"stress_analysis\"").unwrap();
        assert_eq!(kind, CapabilityKind::StressAnalysis);
        assert_eq!(kind.to_string(), "stress_analysis");
    }

    #[test]
    fn every_capability_reads_audio() {
        for kind in [CapabilityKind::SpeechToText, CapabilityKind::StressAnalysis] {
            assert!(kind.parameters().contains(&PARAM_AUDIO_CONTENTS), "{kind}");
        }
    }

    #[test]
    fn take_audio_rejects_empty_and_unknown_format() {
        let mut empty = CapabilityParams::new().with_bytes(PARAM_AUDIO_CONTENTS, Vec::<u8>::new());
        assert!(matches!(
            take_audio(&mut empty),
            Err(ConstructionError::InvalidParameter { .. })
        ));

        let mut flac = CapabilityParams::new()
            .with_bytes(PARAM_AUDIO_CONTENTS, vec![1u8])
            .with_text(PARAM_AUDIO_FORMAT, "flac");
        assert!(matches!(
            take_audio(&mut flac),
            Err(ConstructionError::InvalidParameter { name: PARAM_AUDIO_FORMAT, .. })
        ));
    }

    #[test]
    fn round2_rounds_half_away_from_zero() {
        assert_eq!(round2(0.125), 0.13);
        assert_eq!(round2(1.0 / 3.0), 0.33);
    }
}
