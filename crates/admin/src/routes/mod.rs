//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Liveness check
//! GET  /health/ready                    - Readiness check (document store)
//!
//! # Auth
//! GET  /auth/login                      - Login page
//! POST /auth/login                      - Email/password sign-in
//! POST /auth/logout                     - Sign out
//!
//! # Dashboard
//! GET  /                                - Identity, order stats, recent orders
//!
//! # Email templates
//! GET  /email-templates                 - List templates
//! POST /email-templates/seed            - Create missing templates
//! POST /email-templates/{type}/seed     - Reset one template to its default
//! POST /email-templates/{type}          - Edit subject and body
//!
//! # Orders
//! POST /orders/{id}/confirm-payment     - Confirm bank transfer, email customer
//! POST /orders/{id}/ship                - Mark shipped, email tracking details
//!
//! # API (JSON, 401 when unauthenticated)
//! POST  /api/send-email                 - Send a transactional email
//! PATCH /api/users/{id}/role            - Change an identity record's role
//! POST  /api/products/{id}/images       - Upload product images
//! ```

pub mod api;
pub mod auth;
pub mod dashboard;
pub mod email_templates;
pub mod health;
pub mod orders;

use axum::{Router, response::Redirect};
use serde::Deserialize;

use crate::state::AppState;

/// Build the complete router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(auth::router())
        .merge(dashboard::router())
        .merge(email_templates::router())
        .merge(orders::router())
        .merge(api::router())
}

/// One-shot message carried in the query string after a form redirect.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Flash {
    pub notice: Option<String>,
    pub error: Option<String>,
}

impl Flash {
    /// Redirect to `path` with a success message.
    #[must_use]
    pub fn notice(path: &str, message: &str) -> Redirect {
        Redirect::to(&format!("{path}?notice={}", urlencoding::encode(message)))
    }

    /// Redirect to `path` with an error message.
    #[must_use]
    pub fn error(path: &str, message: &str) -> Redirect {
        Redirect::to(&format!("{path}?error={}", urlencoding::encode(message)))
    }
}
