//! Integration tests for the role and image upload APIs and health checks.

#![allow(clippy::unwrap_used)]

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use kinniku_admin::db::collections;
use kinniku_integration_tests::{TestContext, body_json, body_text};
use serde_json::json;

// ============================================================================
// Roles
// ============================================================================

#[tokio::test]
async fn test_set_role() {
    let mut ctx = TestContext::new();
    ctx.signed_in_admin().await;
    ctx.add_user("u-2", "coach@example.com", "viewer").await;

    let response = ctx
        .patch_json("/api/users/u-2/role", &json!({"role": "trainer"}))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["role"], json!("trainer"));
    assert_eq!(
        ctx.field(collections::USERS, "u-2", "role").await,
        Some(json!("trainer"))
    );
}

#[tokio::test]
async fn test_set_role_rejects_bad_input() {
    let mut ctx = TestContext::new();
    ctx.signed_in_admin().await;

    let response = ctx
        .patch_json("/api/users/admin-1/role", &json!({"role": "owner"}))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = ctx
        .patch_json("/api/users/admin-1/role", &json!({"role": "viewer"}))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = ctx
        .patch_json("/api/users/nobody/role", &json!({"role": "viewer"}))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ============================================================================
// Uploads
// ============================================================================

fn multipart_request(uri: &str, files: &[(&str, &str, &[u8])]) -> Request<Body> {
    let boundary = "kinnikuboundary";
    let mut body = Vec::new();
    for (name, content_type, bytes) in files {
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"images\"; filename=\"{name}\"\r\n\
                 Content-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

    Request::post(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_upload_images() {
    let mut ctx = TestContext::new();
    ctx.signed_in_admin().await;
    ctx.add_product("p-1").await;

    let response = ctx
        .send(multipart_request(
            "/api/products/p-1/images",
            &[("a.jpg", "image/jpeg", b"jpeg".as_slice()), ("b.png", "image/png", b"png".as_slice())],
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let images = ctx.field(collections::PRODUCTS, "p-1", "images").await.unwrap();
    assert_eq!(images.as_array().unwrap().len(), 2);

    let uploads = ctx.storage.uploads();
    assert_eq!(uploads.len(), 2);
    let (path, token, _) = uploads.first().unwrap();
    assert!(path.starts_with("products/p-1/"));
    assert!(path.ends_with(".jpg"));
    assert_eq!(token, "token-admin-1");
}

#[tokio::test]
async fn test_upload_rejects_non_images() {
    let mut ctx = TestContext::new();
    ctx.signed_in_admin().await;
    ctx.add_product("p-1").await;

    let response = ctx
        .send(multipart_request(
            "/api/products/p-1/images",
            &[("notes.txt", "text/plain", b"hello".as_slice())],
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(ctx.storage.uploads().is_empty());
}

#[tokio::test]
async fn test_upload_to_unknown_product_is_404() {
    let mut ctx = TestContext::new();
    ctx.signed_in_admin().await;

    let response = ctx
        .send(multipart_request(
            "/api/products/nope/images",
            &[("a.jpg", "image/jpeg", b"jpeg".as_slice())],
        ))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_endpoints() {
    let mut ctx = TestContext::new();

    let response = ctx.get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "ok");

    assert_eq!(ctx.get("/health/ready").await.status(), StatusCode::OK);
}
