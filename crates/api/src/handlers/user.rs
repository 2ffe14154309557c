//! Handler for `/user`.

use axum::Json;
use serde_json::{json, Value};

use crate::middleware::auth::AuthUser;

/// GET /api/v1/user
///
/// Echo the authenticated caller back as `{"User": {...}}`.
pub async fn get_user(auth: AuthUser) -> Json<Value> {
    Json(json!({
        "User": {
            "id": auth.user_id,
            "username": auth.username,
        }
    }))
}
