//! HTTP-level tests for model registration, listing and the user endpoint.

mod common;

use axum::http::StatusCode;
use common::{body_json, get, get_auth, post_json_auth};
use serde_json::json;

#[tokio::test]
async fn register_model_returns_first_id() {
    let app = common::build_test_app();

    let response = post_json_auth(
        app.app(),
        "/api/v1/models/regis_model",
        json!({ "ml_model_name": "stt" }),
        &app.token(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["id"], 1001);
    assert_eq!(json["ml_model_name"], "stt");
}

#[tokio::test]
async fn register_duplicate_name_is_conflict() {
    let app = common::build_test_app();
    common::register_model(&app, "stt").await;

    let response = post_json_auth(
        app.app(),
        "/api/v1/models/regis_model",
        json!({ "ml_model_name": " stt " }),
        &app.token(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "CONFLICT");
}

#[tokio::test]
async fn register_blank_name_is_validation_error() {
    let app = common::build_test_app();

    let response = post_json_auth(
        app.app(),
        "/api/v1/models/regis_model",
        json!({ "ml_model_name": "   " }),
        &app.token(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn model_without_descriptor_can_still_be_registered() {
    let app = common::build_test_app();
    let id = common::register_model(&app, "diarize").await;
    assert_eq!(id, 1001);
}

#[tokio::test]
async fn list_models_returns_registered_models() {
    let app = common::build_test_app();
    let stt = common::register_model(&app, "stt").await;
    let sa = common::register_model(&app, "sa").await;

    let response = get_auth(app.app(), "/api/v1/models", &app.token()).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let models = json.as_array().unwrap();
    assert_eq!(models.len(), 2);
    assert_eq!(models[0]["id"], stt);
    assert_eq!(models[1]["id"], sa);
    assert_eq!(models[1]["ml_model_name"], "sa");
}

#[tokio::test]
async fn routes_require_a_token() {
    let app = common::build_test_app();

    let response = get(app.app(), "/api/v1/models").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "UNAUTHORIZED");

    let response = get_auth(app.app(), "/api/v1/user", "not-a-jwt").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn user_endpoint_echoes_token_identity() {
    let app = common::build_test_app();

    let response = get_auth(app.app(), "/api/v1/user", &app.token()).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["User"]["id"], 1);
    assert_eq!(json["User"]["username"], "tester");
}

#[tokio::test]
async fn issuer_token_maps_id_to_user() {
    let app = common::build_test_app();
    let token = common::issue_token(&app.config.jwt, 7, "alice");

    let response = get_auth(app.app(), "/api/v1/user", &token).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["User"]["id"], 7);
    assert_eq!(json["User"]["username"], "alice");
}
