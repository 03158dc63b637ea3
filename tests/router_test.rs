// tests/router_test.rs
//
// Rotas que respondem sem tocar no banco.

mod common;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use common::{mint_token, offline_state, router, send};

#[tokio::test]
async fn health_is_public() {
    let app = router(offline_state());

    let (status, _) = send(&app, "GET", "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = router(offline_state());

    let (status, body) = send(&app, "GET", "/api-docs/openapi.json", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/api/assignments"].is_object());
    assert!(body["paths"]["/api/permissions/check"].is_object());
}

#[tokio::test]
async fn protected_routes_require_bearer_token() {
    let app = router(offline_state());

    for (method, uri) in [
        ("GET", "/api/assignments"),
        ("POST", "/api/assignments/transfer"),
        ("GET", "/api/me/access"),
        ("GET", "/api/locations"),
    ] {
        let (status, body) = send(&app, method, uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{} {}", method, uri);
        assert!(body["error"].is_string());
    }
}

#[tokio::test]
async fn forged_token_is_rejected() {
    let app = router(offline_state());

    let (status, _) = send(&app, "GET", "/api/me/access", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_context_type_in_path_is_bad_request() {
    let app = router(offline_state());
    let token = mint_token(Uuid::new_v4(), Uuid::new_v4());

    let uri = format!("/api/contexts/warehouse/{}/assignments", Uuid::new_v4());
    let (status, body) = send(&app, "GET", &uri, Some(&token), None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("warehouse"));
}

async fn send_in_portuguese(method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let app = router(offline_state());
    let token = mint_token(Uuid::new_v4(), Uuid::new_v4());

    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::ACCEPT_LANGUAGE, "pt-BR,pt;q=0.9");
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn unknown_context_type_in_body_is_localized_bad_request() {
    let body = json!({ "context_type": "warehouse", "context_id": Uuid::new_v4() });
    let (status, body) = send_in_portuguese("POST", "/api/assignments/validate-context", Some(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error = body["error"].as_str().unwrap();
    assert!(error.starts_with("Requisição malformada"), "{}", error);
    assert!(error.contains("warehouse"));
}

#[tokio::test]
async fn unknown_context_type_in_query_is_localized_bad_request() {
    let (status, body) = send_in_portuguese("GET", "/api/assignments?context_type=warehouse", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Requisição malformada"));
}

#[tokio::test]
async fn malformed_json_body_uses_the_api_error_shape() {
    let app = router(offline_state());
    let token = mint_token(Uuid::new_v4(), Uuid::new_v4());

    let (status, body) = send(
        &app,
        "POST",
        "/api/permissions/check",
        Some(&token),
        Some(json!({ "user_id": "not-a-uuid" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Malformed request"));
}
