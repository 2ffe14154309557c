//! Repository for the `ml_models` table.

use sqlx::PgConnection;
use vocalis_core::types::DbId;

use crate::models::ml_model::MlModelRow;

/// Column list for `ml_models` queries.
const COLUMNS: &str = "id, ml_model_name";

pub struct MlModelRepo;

impl MlModelRepo {
    /// Register a model name. Ids come from `ml_model_seq`, starting at 1001.
    ///
    /// A duplicate name violates `uq_ml_models_name`.
    pub async fn create(conn: &mut PgConnection, name: &str) -> Result<MlModelRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO ml_models (ml_model_name) VALUES ($1) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, MlModelRow>(&query)
            .bind(name)
            .fetch_one(conn)
            .await
    }

    pub async fn find_by_id(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<MlModelRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM ml_models WHERE id = $1");
        sqlx::query_as::<_, MlModelRow>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    pub async fn list(conn: &mut PgConnection) -> Result<Vec<MlModelRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM ml_models ORDER BY id");
        sqlx::query_as::<_, MlModelRow>(&query)
            .fetch_all(conn)
            .await
    }
}
