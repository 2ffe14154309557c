//! Repository for the `ml_models_inference` table.

use sqlx::PgConnection;
use vocalis_core::jobs::NewJob;
use vocalis_core::types::DbId;

use crate::models::job::InferenceJobRow;

/// Column list for `ml_models_inference` queries.
const COLUMNS: &str = "\
    id, model_id, file_name, correlation_id, transaction, \
    complete, message, updated_at";

pub struct JobRepo;

impl JobRepo {
    /// Insert a new incomplete job.
    pub async fn create(
        conn: &mut PgConnection,
        input: &NewJob,
    ) -> Result<InferenceJobRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO ml_models_inference (model_id, file_name, correlation_id, transaction, complete, message) \
             VALUES ($1, $2, $3, $4, FALSE, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, InferenceJobRow>(&query)
            .bind(input.model_id)
            .bind(&input.file_name)
            .bind(&input.correlation_id)
            .bind(&input.transaction)
            .bind(&input.message)
            .fetch_one(conn)
            .await
    }

    pub async fn find_by_id(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<InferenceJobRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM ml_models_inference WHERE id = $1");
        sqlx::query_as::<_, InferenceJobRow>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Jobs for one model and correlation id, oldest first.
    pub async fn list_by_correlation(
        conn: &mut PgConnection,
        model_id: DbId,
        correlation_id: &str,
    ) -> Result<Vec<InferenceJobRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM ml_models_inference \
             WHERE model_id = $1 AND correlation_id = $2 \
             ORDER BY id"
        );
        sqlx::query_as::<_, InferenceJobRow>(&query)
            .bind(model_id)
            .bind(correlation_id)
            .fetch_all(conn)
            .await
    }

    /// Mark a job complete with its terminal message.
    ///
    /// Guarded on `complete = FALSE`; returns `false` when no row was
    /// updated (unknown id or already terminal).
    pub async fn complete(
        conn: &mut PgConnection,
        id: DbId,
        message: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE ml_models_inference \
             SET complete = TRUE, message = $2, updated_at = NOW() \
             WHERE id = $1 AND complete = FALSE",
        )
        .bind(id)
        .bind(message)
        .execute(conn)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}
