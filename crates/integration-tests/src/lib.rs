//! Integration test harness for Kinniku Admin.
//!
//! Drives the real router with `tower::ServiceExt::oneshot`. External
//! services are replaced by in-process fakes:
//!
//! - [`FakeProvider`] - email/password accounts held in memory
//! - [`RecordingTransport`] - captures outgoing mail, can be told to fail
//! - [`FakeStorage`] - returns deterministic download URLs
//!
//! Documents live in a [`MemoryDocumentStore`] shared with the test so it can
//! seed records and inspect the results.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p kinniku-integration-tests
//! ```

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, Response, StatusCode, header};
use secrecy::SecretString;
use serde_json::{Value, json};
use tower::ServiceExt;

use kinniku_admin::config::{AdminConfig, EmailConfig, FirebaseConfig};
use kinniku_admin::db::{DocumentStore, MemoryDocumentStore, collections, to_fields};
use kinniku_admin::models::ProviderSession;
use kinniku_admin::services::{
    BlobStorage, IdentityProvider, MailTransport, OutboundMail, ProviderError, StorageError,
    TransportError,
};
use kinniku_admin::state::AppState;
use kinniku_core::UserId;

/// Password every fake account accepts.
pub const PASSWORD: &str = "correct horse battery staple";

// ============================================================================
// Fakes
// ============================================================================

/// Identity provider with a fixed set of accounts.
#[derive(Default)]
pub struct FakeProvider {
    accounts: Mutex<HashMap<String, String>>,
}

impl FakeProvider {
    /// Register an account; any email not registered is unknown.
    pub fn add_account(&self, email: &str, uid: &str) {
        self.accounts
            .lock()
            .unwrap()
            .insert(email.to_string(), uid.to_string());
    }
}

#[async_trait]
impl IdentityProvider for FakeProvider {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<ProviderSession, ProviderError> {
        if !email.contains('@') {
            return Err(ProviderError::InvalidEmail);
        }
        let uid = self.accounts.lock().unwrap().get(email).cloned();
        match uid {
            Some(uid) if password == PASSWORD => Ok(ProviderSession {
                uid: UserId::new(uid.clone()),
                email: Some(email.to_string()),
                display_name: None,
                id_token: format!("token-{uid}"),
            }),
            _ => Err(ProviderError::InvalidCredentials),
        }
    }
}

/// Mail transport that records messages.
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<OutboundMail>>,
    fail: AtomicBool,
}

impl RecordingTransport {
    /// Make every following send fail (or succeed again).
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Messages delivered so far.
    pub fn sent(&self) -> Vec<OutboundMail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailTransport for RecordingTransport {
    async fn send(&self, mail: &OutboundMail) -> Result<(), TransportError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(TransportError::Unavailable("relay refused".to_string()));
        }
        self.sent.lock().unwrap().push(mail.clone());
        Ok(())
    }
}

/// Blob storage that remembers uploads.
#[derive(Default)]
pub struct FakeStorage {
    uploads: Mutex<Vec<(String, String, usize)>>,
}

impl FakeStorage {
    /// `(path, id_token, size)` of each upload.
    pub fn uploads(&self) -> Vec<(String, String, usize)> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl BlobStorage for FakeStorage {
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        _content_type: &str,
        id_token: &str,
    ) -> Result<String, StorageError> {
        self.uploads
            .lock()
            .unwrap()
            .push((path.to_string(), id_token.to_string(), bytes.len()));
        Ok(format!("https://storage.test/{path}"))
    }
}

// ============================================================================
// Context
// ============================================================================

/// Configuration that never reaches a real service.
#[must_use]
pub fn test_config() -> AdminConfig {
    AdminConfig {
        database_url: None,
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 3001,
        base_url: "http://localhost:3001".to_string(),
        firebase: FirebaseConfig {
            api_key: SecretString::from("test-api-key"),
            storage_bucket: Some("kinniku-test.appspot.com".to_string()),
            auth_endpoint: "http://127.0.0.1:9".to_string(),
            storage_endpoint: "http://127.0.0.1:9".to_string(),
        },
        email: EmailConfig {
            smtp_host: "localhost".to_string(),
            smtp_port: 2525,
            smtp_username: "test".to_string(),
            smtp_password: SecretString::from("test"),
            from_address: "shop@kinniku-shop.example.com".to_string(),
            from_name: "Kinniku Shop".to_string(),
        },
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 0.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// A running app plus handles on its fakes, acting as one browser.
pub struct TestContext {
    pub store: Arc<MemoryDocumentStore>,
    pub provider: Arc<FakeProvider>,
    pub transport: Arc<RecordingTransport>,
    pub storage: Arc<FakeStorage>,
    app: Router,
    cookie: Option<String>,
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl TestContext {
    #[must_use]
    pub fn new() -> Self {
        let store = Arc::new(MemoryDocumentStore::new());
        let provider = Arc::new(FakeProvider::default());
        let transport = Arc::new(RecordingTransport::default());
        let storage = Arc::new(FakeStorage::default());

        let state = AppState::from_parts(
            test_config(),
            store.clone(),
            provider.clone(),
            transport.clone(),
            Some(storage.clone() as Arc<dyn BlobStorage>),
        );

        Self {
            store,
            provider,
            transport,
            storage,
            app: kinniku_admin::app(state),
            cookie: None,
        }
    }

    /// A fresh browser against the same app and data.
    #[must_use]
    pub fn new_browser(&self) -> Self {
        Self {
            store: self.store.clone(),
            provider: self.provider.clone(),
            transport: self.transport.clone(),
            storage: self.storage.clone(),
            app: self.app.clone(),
            cookie: None,
        }
    }

    // ------------------------------------------------------------------------
    // Seeding
    // ------------------------------------------------------------------------

    /// Create a provider account and its identity record.
    pub async fn add_user(&self, uid: &str, email: &str, role: &str) {
        self.provider.add_account(email, uid);
        self.store
            .upsert(
                collections::USERS,
                uid,
                to_fields(&json!({
                    "email": email,
                    "displayName": format!("User {uid}"),
                    "role": role,
                }))
                .unwrap(),
            )
            .await
            .unwrap();
    }

    /// Create a provider account with no identity record.
    pub fn add_account_only(&self, uid: &str, email: &str) {
        self.provider.add_account(email, uid);
    }

    /// Insert a pending bank-transfer order.
    pub async fn add_order(&self, id: &str, order_number: &str) {
        self.store
            .upsert(
                collections::ORDERS,
                id,
                to_fields(&json!({
                    "orderNumber": order_number,
                    "customer": {"name": "山田 太郎", "email": "taro@example.com"},
                    "shippingAddress": {
                        "zipCode": "150-0001",
                        "prefecture": "東京都",
                        "city": "渋谷区",
                        "address": "神宮前1-2-3",
                    },
                    "items": [
                        {"productId": "p1", "productName": "ホエイプロテイン", "price": 4_980, "quantity": 2}
                    ],
                    "subtotal": 9_960,
                    "tax": 996,
                    "shipping": 0,
                    "total": 10_956,
                    "paymentMethod": "bank_transfer",
                    "paymentStatus": "pending",
                    "status": "pending",
                    "createdAt": "2024-11-26T01:00:00Z",
                }))
                .unwrap(),
            )
            .await
            .unwrap();
    }

    /// Insert a product with no images.
    pub async fn add_product(&self, id: &str) {
        self.store
            .upsert(
                collections::PRODUCTS,
                id,
                to_fields(&json!({"name": "ホエイプロテイン", "images": []})).unwrap(),
            )
            .await
            .unwrap();
    }

    /// A top-level field of a stored document.
    pub async fn field(&self, collection: &str, id: &str, field: &str) -> Option<Value> {
        self.store
            .get_by_id(collection, id)
            .await
            .unwrap()
            .and_then(|doc| doc.fields.get(field).cloned())
    }

    // ------------------------------------------------------------------------
    // Requests
    // ------------------------------------------------------------------------

    /// Send a request with this browser's session cookie.
    pub async fn send(&mut self, request: Request<Body>) -> Response<Body> {
        let mut request = request;
        if let Some(cookie) = &self.cookie {
            request
                .headers_mut()
                .insert(header::COOKIE, cookie.parse().unwrap());
        }

        let response = self.app.clone().oneshot(request).await.unwrap();

        if let Some(set_cookie) = response.headers().get(header::SET_COOKIE) {
            let pair = set_cookie
                .to_str()
                .unwrap()
                .split(';')
                .next()
                .unwrap()
                .to_string();
            self.cookie = Some(pair);
        }
        response
    }

    pub async fn get(&mut self, uri: &str) -> Response<Body> {
        self.send(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post_form(&mut self, uri: &str, form: &[(&str, &str)]) -> Response<Body> {
        let body = form
            .iter()
            .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        self.send(
            Request::post(uri)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
    }

    pub async fn post_json(&mut self, uri: &str, body: &Value) -> Response<Body> {
        self.send(
            Request::post(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn patch_json(&mut self, uri: &str, body: &Value) -> Response<Body> {
        self.send(
            Request::patch(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    /// Sign in through the login form.
    pub async fn sign_in(&mut self, email: &str, password: &str) -> Response<Body> {
        self.post_form("/auth/login", &[("email", email), ("password", password)])
            .await
    }

    /// Create an admin and sign this browser in as them.
    pub async fn signed_in_admin(&mut self) {
        self.add_user("admin-1", "admin@example.com", "admin").await;
        let response = self.sign_in("admin@example.com", PASSWORD).await;
        assert_eq!(location(&response).as_deref(), Some("/"));
    }
}

// ============================================================================
// Response helpers
// ============================================================================

/// `Location` header of a redirect.
#[must_use]
pub fn location(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Whether the response redirects to the login page.
#[must_use]
pub fn is_login_redirect(response: &Response<Body>) -> bool {
    response.status().is_redirection() && location(response).as_deref() == Some("/auth/login")
}

/// Read the body as text.
pub async fn body_text(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Read the body as JSON.
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Assert a status code with the body in the failure message.
pub async fn assert_status(response: Response<Body>, expected: StatusCode) -> String {
    let status = response.status();
    let body = body_text(response).await;
    assert_eq!(status, expected, "unexpected status, body: {body}");
    body
}
