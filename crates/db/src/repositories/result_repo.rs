//! Repositories for the capability result tables `stt_result` and
//! `sa_result`.

use sqlx::PgConnection;
use vocalis_core::results::{SaResult, SttResult};
use vocalis_core::types::DbId;

use crate::models::result::{SaResultRow, SttResultRow};

/// Column list for `stt_result` queries.
const STT_COLUMNS: &str = "\
    job_id, model_id, correlation_id, transcription, audio_duration, \
    start_time, finish_time, stt_duration, inserted_at";

/// Column list for `sa_result` queries.
const SA_COLUMNS: &str = "\
    job_id, model_id, correlation_id, emotion_result, confidence_value, \
    audio_duration, start_time, finish_time, sa_duration, inserted_at";

pub struct SttResultRepo;

impl SttResultRepo {
    pub async fn insert(conn: &mut PgConnection, row: &SttResult) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO stt_result \
                 (job_id, model_id, correlation_id, transcription, audio_duration, \
                  start_time, finish_time, stt_duration, inserted_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(row.job_id)
        .bind(row.model_id)
        .bind(&row.correlation_id)
        .bind(&row.transcription)
        .bind(row.audio_duration)
        .bind(row.start_time)
        .bind(row.finish_time)
        .bind(row.stt_duration)
        .bind(row.inserted_at)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Rows for one model and correlation id in insertion order.
    pub async fn list_by_correlation(
        conn: &mut PgConnection,
        model_id: DbId,
        correlation_id: &str,
    ) -> Result<Vec<SttResultRow>, sqlx::Error> {
        let query = format!(
            "SELECT {STT_COLUMNS} FROM stt_result \
             WHERE model_id = $1 AND correlation_id = $2 \
             ORDER BY inserted_at, job_id"
        );
        sqlx::query_as::<_, SttResultRow>(&query)
            .bind(model_id)
            .bind(correlation_id)
            .fetch_all(conn)
            .await
    }
}

pub struct SaResultRepo;

impl SaResultRepo {
    pub async fn insert(conn: &mut PgConnection, row: &SaResult) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO sa_result \
                 (job_id, model_id, correlation_id, emotion_result, confidence_value, \
                  audio_duration, start_time, finish_time, sa_duration, inserted_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(row.job_id)
        .bind(row.model_id)
        .bind(&row.correlation_id)
        .bind(&row.emotion_result)
        .bind(row.confidence_value)
        .bind(row.audio_duration)
        .bind(row.start_time)
        .bind(row.finish_time)
        .bind(row.sa_duration)
        .bind(row.inserted_at)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Rows for one model and correlation id in insertion order.
    pub async fn list_by_correlation(
        conn: &mut PgConnection,
        model_id: DbId,
        correlation_id: &str,
    ) -> Result<Vec<SaResultRow>, sqlx::Error> {
        let query = format!(
            "SELECT {SA_COLUMNS} FROM sa_result \
             WHERE model_id = $1 AND correlation_id = $2 \
             ORDER BY inserted_at, job_id"
        );
        sqlx::query_as::<_, SaResultRow>(&query)
            .bind(model_id)
            .bind(correlation_id)
            .fetch_all(conn)
            .await
    }
}
