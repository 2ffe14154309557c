//! Route definitions for the `/models` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{inference, models, query};
use crate::state::AppState;

/// Routes mounted at `/models`.
///
/// ```text
/// GET    /                          -> list_models
/// POST   /regis_model               -> register_model
/// POST   /{model_id}/inference      -> submit_inference
/// GET    /{model_id}/responses      -> list_responses
/// GET    /{model_id}/results        -> list_results
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(models::list_models))
        .route("/regis_model", post(models::register_model))
        .route("/{model_id}/inference", post(inference::submit_inference))
        .route("/{model_id}/responses", get(query::list_responses))
        .route("/{model_id}/results", get(query::list_results))
}
