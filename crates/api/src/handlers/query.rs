//! Status and result lookup by model id and correlation id.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use vocalis_core::error::CoreError;
use vocalis_core::query::QueryService;
use vocalis_core::types::DbId;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// The only response type that can be queried.
const RESPONSE_TYPE_INFERENCE: &str = "inference";

/// Query parameters for `GET /models/{id}/responses`.
#[derive(Debug, Deserialize)]
pub struct ResponsesQuery {
    /// Defaults to `inference`.
    #[serde(rename = "type")]
    pub response_type: Option<String>,
    pub correlation_id: String,
}

/// Query parameters for `GET /models/{id}/results`.
#[derive(Debug, Deserialize)]
pub struct ResultsQuery {
    pub correlation_id: String,
}

/// GET /api/v1/models/{model_id}/responses?type=inference&correlation_id=
///
/// Job snapshots for the pair, oldest first. Empty when there are none.
pub async fn list_responses(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(model_id): Path<DbId>,
    Query(params): Query<ResponsesQuery>,
) -> AppResult<impl IntoResponse> {
    if let Some(kind) = params.response_type.as_deref() {
        if kind != RESPONSE_TYPE_INFERENCE {
            return Err(CoreError::Validation(format!(
                "Unsupported response type '{kind}'. Expected '{RESPONSE_TYPE_INFERENCE}'"
            ))
            .into());
        }
    }

    let mut scope = state.store.scope().await?;
    let snapshots = QueryService::status(scope.as_mut(), model_id, &params.correlation_id).await?;
    Ok(Json(snapshots))
}

/// GET /api/v1/models/{model_id}/results?correlation_id=
///
/// Result rows projected to the model's output columns. 404 when the model
/// is not registered or no row matches.
pub async fn list_results(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(model_id): Path<DbId>,
    Query(params): Query<ResultsQuery>,
) -> AppResult<impl IntoResponse> {
    let mut scope = state.store.scope().await?;
    let rows = QueryService::results(
        scope.as_mut(),
        &state.resolver,
        model_id,
        &params.correlation_id,
    )
    .await?;
    Ok(Json(rows))
}
