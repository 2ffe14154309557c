//! Handlers for model registration and listing.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use validator::Validate;
use vocalis_core::error::CoreError;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Body of `POST /api/v1/models/regis_model`.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterModel {
    #[validate(length(min = 1, max = 100, message = "must be 1-100 characters"))]
    pub ml_model_name: String,
}

/// POST /api/v1/models/regis_model
///
/// Register a model name. Returns 201 with `{id, ml_model_name}`; a name
/// that already exists is 409. Registering a name with no descriptor is
/// allowed, but inference against it fails with `NOT_REGISTERED` until the
/// model config has an entry for it.
pub async fn register_model(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(mut input): Json<RegisterModel>,
) -> AppResult<impl IntoResponse> {
    input.ml_model_name = input.ml_model_name.trim().to_string();
    input
        .validate()
        .map_err(|e| CoreError::Validation(e.to_string()))?;

    let mut scope = state.store.scope().await?;
    let model = scope.insert_model(&input.ml_model_name).await?;

    if state.resolver.registry().get(&model.ml_model_name).is_none() {
        tracing::warn!(
            model_id = model.id,
            model_name = %model.ml_model_name,
            "Registered model has no capability descriptor",
        );
    }
    tracing::info!(
        model_id = model.id,
        model_name = %model.ml_model_name,
        user_id = auth.user_id,
        "Model registered",
    );

    Ok((StatusCode::CREATED, Json(model)))
}

/// GET /api/v1/models
pub async fn list_models(
    _auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let mut scope = state.store.scope().await?;
    let models = scope.list_models().await?;
    Ok(Json(models))
}
