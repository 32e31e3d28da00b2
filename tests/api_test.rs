mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;
use uuid::Uuid;

use common::{json_body, token, TestApp};

#[tokio::test]
async fn health_check() {
    let app = TestApp::offline();
    let response = app.request(Method::GET, "/health", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "healthy");
}

#[tokio::test]
async fn admin_routes_require_a_token() {
    let app = TestApp::offline();
    let response = app.request(Method::GET, "/api/v1/admin/orders", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["message"], "Authentication required");
    assert_eq!(body["message_ar"], "يجب تسجيل الدخول");
}

#[tokio::test]
async fn tokens_signed_with_another_secret_are_rejected() {
    let app = TestApp::offline();
    let forged = token(Uuid::new_v4(), "not-the-server-secret", 3600);
    let response = app.request(Method::GET, "/api/v1/admin/me", None, Some(&forged)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app.request(Method::GET, "/api/v1/admin/me", None, Some("invalid.token")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn checkout_rejects_bad_phone_before_touching_stock() {
    let app = TestApp::offline();
    let body = json!({
        "customer_name": "Karim Haddad",
        "customer_phone": "12345",
        "wilaya_code": 16,
        "items": [{ "product_id": Uuid::new_v4(), "quantity": 1 }]
    });
    let response = app.request(Method::POST, "/api/v1/checkout", Some(body), None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["message"].as_str().unwrap().starts_with("Invalid input"));
}

#[tokio::test]
async fn quote_rejects_an_empty_cart() {
    let app = TestApp::offline();
    let response = app
        .request(Method::POST, "/api/v1/checkout/quote", Some(json!({ "items": [] })), None)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn overlong_cart_session_is_rejected() {
    let app = TestApp::offline();
    let uri = format!("/api/v1/cart/{}", "s".repeat(129));
    let response = app.request(Method::GET, &uri, None, None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
