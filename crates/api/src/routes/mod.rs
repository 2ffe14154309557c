pub mod health;
pub mod models;

use axum::routing::get;
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /user                                            authenticated caller
///
/// /models                                          list
/// /models/regis_model                              register (POST)
/// /models/{model_id}/inference                     submit audio (POST, multipart)
/// /models/{model_id}/responses                     job snapshots by correlation id
/// /models/{model_id}/results                       result rows by correlation id
/// ```
///
/// Every route requires a Bearer token.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/user", get(handlers::user::get_user))
        .nest("/models", models::router())
}
