use crate::store::StoreError;
use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    /// The model id is unknown, or its name has no capability descriptor.
    #[error("Model {model_id} has not been registered to the system")]
    NotRegistered { model_id: DbId },

    /// A result query matched zero rows.
    #[error("No records found for model {model_id} and correlation_id '{correlation_id}'")]
    NoResults {
        model_id: DbId,
        correlation_id: String,
    },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}
