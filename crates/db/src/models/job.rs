use sqlx::FromRow;
use vocalis_core::jobs::Job;
use vocalis_core::types::{DbId, Timestamp};

/// A row from the `ml_models_inference` table.
#[derive(Debug, Clone, FromRow)]
pub struct InferenceJobRow {
    pub id: DbId,
    pub model_id: DbId,
    pub file_name: String,
    pub correlation_id: String,
    pub transaction: String,
    pub complete: bool,
    pub message: Option<String>,
    pub updated_at: Timestamp,
}

impl From<InferenceJobRow> for Job {
    fn from(row: InferenceJobRow) -> Self {
        Self {
            id: row.id,
            model_id: row.model_id,
            file_name: row.file_name,
            correlation_id: row.correlation_id,
            transaction: row.transaction,
            complete: row.complete,
            message: row.message,
            updated_at: row.updated_at,
        }
    }
}
