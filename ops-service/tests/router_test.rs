mod common;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
};
use common::{router, test_config, DB_DOWN_MODULE, HEALTHY_MODULE};
use ops_service::config::DEFAULT_STATUS_MODULE;
use ops_service::services::ProbeRegistry;
use ops_service::startup::AppState;
use std::sync::Arc;
use tower::util::ServiceExt;

async fn get(app: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, body)
}

#[tokio::test]
async fn settings_detail_is_redacted() {
    let (app, _) = router(test_config(HEALTHY_MODULE, false));

    let (status, body) = get(app, "/services/settings/SECRET_KEY/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["key"], "SECRET_KEY");
    assert_eq!(body["value"], "********************");
    assert_eq!(body["resource_uri"], "/services/settings/SECRET_KEY/");
}

#[tokio::test]
async fn settings_detail_renders_non_string_values_as_text() {
    let (app, _) = router(test_config(HEALTHY_MODULE, false));

    let (status, body) = get(app, "/services/settings/DEBUG/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["value"], "false");
}

#[tokio::test]
async fn unknown_setting_is_bodiless_404_even_outside_debug() {
    let (app, mailer) = router(test_config(HEALTHY_MODULE, false));

    let (status, body) = get(app, "/services/settings/missing/").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.is_null());
    assert_eq!(mailer.send_count(), 0);
}

#[tokio::test]
async fn status_detail_returns_single_object() {
    let (app, _) = router(test_config(HEALTHY_MODULE, false));

    let (status, body) = get(app, "/services/status/status/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cache"], true);
    assert_eq!(body["db"], true);
    assert_eq!(body["settings"], true);
    assert_eq!(body["resource_uri"], "/services/status/status/");
}

#[tokio::test]
async fn status_detail_with_other_pk_is_404() {
    let (app, _) = router(test_config(HEALTHY_MODULE, false));

    let (status, _) = get(app, "/services/status/other/").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn status_detail_fails_like_listing() {
    let (app, _) = router(test_config(DB_DOWN_MODULE, false));

    let (status, body) = get(app, "/services/status/status/").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body["error_message"],
        "<Status: cache: true, db: false, settings: true>"
    );
}

#[tokio::test]
async fn default_status_module_is_unconfigured() {
    let (app, _) = router(test_config(DEFAULT_STATUS_MODULE, true));

    let (status, body) = get(app, "/services/status/").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error_data"]["cache"], false);
    assert_eq!(body["error_data"]["db"], false);
    assert_eq!(body["error_data"]["settings"], true);
}

#[tokio::test]
async fn non_get_methods_are_rejected() {
    let (app, _) = router(test_config(HEALTHY_MODULE, false));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/services/settings/")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn responses_carry_request_id() {
    let (app, _) = router(test_config(HEALTHY_MODULE, false));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/services/error/")
                .header("x-request-id", "abc-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.headers()["x-request-id"], "abc-123");
}

#[test]
fn unknown_status_module_is_rejected_at_startup() {
    let config = test_config("myapp.status", false);
    let mailer = Arc::new(ops_service::services::MockAdminMailer::new());

    let result = AppState::new(config, &ProbeRegistry::with_builtin(), mailer);

    assert!(result.is_err());
}
