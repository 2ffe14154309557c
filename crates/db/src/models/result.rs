use sqlx::FromRow;
use vocalis_core::results::{SaResult, SttResult};
use vocalis_core::types::{DbId, Timestamp};

/// A row from the `stt_result` table.
#[derive(Debug, Clone, FromRow)]
pub struct SttResultRow {
    pub job_id: DbId,
    pub model_id: DbId,
    pub correlation_id: String,
    pub transcription: String,
    pub audio_duration: f64,
    pub start_time: Timestamp,
    pub finish_time: Timestamp,
    pub stt_duration: f64,
    pub inserted_at: Timestamp,
}

impl From<SttResultRow> for SttResult {
    fn from(row: SttResultRow) -> Self {
        Self {
            job_id: row.job_id,
            model_id: row.model_id,
            correlation_id: row.correlation_id,
            transcription: row.transcription,
            audio_duration: row.audio_duration,
            start_time: row.start_time,
            finish_time: row.finish_time,
            stt_duration: row.stt_duration,
            inserted_at: row.inserted_at,
        }
    }
}

/// A row from the `sa_result` table.
#[derive(Debug, Clone, FromRow)]
pub struct SaResultRow {
    pub job_id: DbId,
    pub model_id: DbId,
    pub correlation_id: String,
    pub emotion_result: String,
    pub confidence_value: f64,
    pub audio_duration: f64,
    pub start_time: Timestamp,
    pub finish_time: Timestamp,
    pub sa_duration: f64,
    pub inserted_at: Timestamp,
}

impl From<SaResultRow> for SaResult {
    fn from(row: SaResultRow) -> Self {
        Self {
            job_id: row.job_id,
            model_id: row.model_id,
            correlation_id: row.correlation_id,
            emotion_result: row.emotion_result,
            confidence_value: row.confidence_value,
            audio_duration: row.audio_duration,
            start_time: row.start_time,
            finish_time: row.finish_time,
            sa_duration: row.sa_duration,
            inserted_at: row.inserted_at,
        }
    }
}
