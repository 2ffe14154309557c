use sqlx::FromRow;
use vocalis_core::models::Model;
use vocalis_core::types::DbId;

/// A row from the `ml_models` table.
#[derive(Debug, Clone, FromRow)]
pub struct MlModelRow {
    pub id: DbId,
    pub ml_model_name: String,
}

impl From<MlModelRow> for Model {
    fn from(row: MlModelRow) -> Self {
        Self {
            id: row.id,
            ml_model_name: row.ml_model_name,
        }
    }
}
