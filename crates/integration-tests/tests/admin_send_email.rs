//! Integration tests for `POST /api/send-email`.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use kinniku_integration_tests::{TestContext, body_json};
use serde_json::json;

async fn ready() -> TestContext {
    let mut ctx = TestContext::new();
    ctx.signed_in_admin().await;
    ctx.post_form("/email-templates/seed", &[]).await;
    ctx
}

#[tokio::test]
async fn test_send_email_success() {
    let mut ctx = ready().await;

    let response = ctx
        .post_json(
            "/api/send-email",
            &json!({
                "type": "order_complete_bank",
                "data": {
                    "to": "taro@example.com",
                    "customerName": "山田 太郎",
                    "orderNumber": "KS-20241126-001",
                    "total": 12800,
                }
            }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"success": true}));

    let sent = ctx.transport.sent();
    assert_eq!(sent.len(), 1);
    let mail = sent.first().unwrap();
    assert_eq!(mail.to, "taro@example.com");
    assert!(mail.subject.contains("KS-20241126-001"));
    assert!(mail.text.contains("山田 太郎"));
    assert!(mail.text.contains("12,800"));
}

#[tokio::test]
async fn test_unknown_type_is_400() {
    let mut ctx = ready().await;

    let response = ctx
        .post_json(
            "/api/send-email",
            &json!({"type": "welcome", "data": {"to": "taro@example.com"}}),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await, json!({"error": "Unknown email type"}));
    assert!(ctx.transport.sent().is_empty());
}

#[tokio::test]
async fn test_missing_recipient_is_400() {
    let mut ctx = ready().await;

    let response = ctx
        .post_json(
            "/api/send-email",
            &json!({"type": "payment_confirmed", "data": {"orderNumber": "KS-1"}}),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await, json!({"error": "Missing recipient address"}));
}

#[tokio::test]
async fn test_missing_template_is_500() {
    let mut ctx = TestContext::new();
    ctx.signed_in_admin().await;

    let response = ctx
        .post_json(
            "/api/send-email",
            &json!({"type": "payment_confirmed", "data": {"to": "taro@example.com"}}),
        )
        .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await, json!({"error": "Failed to send email"}));
}

#[tokio::test]
async fn test_transport_failure_is_500() {
    let mut ctx = ready().await;
    ctx.transport.set_failing(true);

    let response = ctx
        .post_json(
            "/api/send-email",
            &json!({"type": "shipping_complete", "data": {"to": "taro@example.com"}}),
        )
        .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await, json!({"error": "Failed to send email"}));
}
