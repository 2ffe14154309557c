//! Registered ML models.

use serde::{Deserialize, Serialize};

use crate::types::DbId;

/// A row from the `ml_models` table.
///
/// The name is what ties a model to a capability descriptor in the
/// registry; the id is what callers put in request paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    pub id: DbId,
    pub ml_model_name: String,
}

/// Ids handed out by the model sequence start here.
pub const FIRST_MODEL_ID: DbId = 1001;
