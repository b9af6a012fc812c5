//! Transactional email endpoint.
//!
//! `POST /api/send-email` with `{"type": "...", "data": {...}}`. `data.to` is
//! the recipient; every other field becomes a template variable.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::instrument;

use kinniku_core::TemplateType;

use crate::{
    middleware::RequireAdminAuth,
    services::{NotificationDispatcher, notifications::variables},
    state::AppState,
};

/// Request body.
#[derive(Debug, Deserialize)]
pub struct SendEmailRequest {
    #[serde(rename = "type")]
    pub email_type: String,
    #[serde(default)]
    pub data: Map<String, Value>,
}

/// Build the send-email router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/send-email", post(send_email))
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// Render and send one transactional email.
///
/// POST /api/send-email
#[instrument(skip_all)]
async fn send_email(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    Json(request): Json<SendEmailRequest>,
) -> Response {
    let Ok(template_type) = request.email_type.parse::<TemplateType>() else {
        return error_response(StatusCode::BAD_REQUEST, "Unknown email type");
    };

    let (recipient, variables) = variables::from_payload(&request.data);
    let Some(recipient) = recipient else {
        tracing::warn!("send-email request without recipient");
        return error_response(StatusCode::BAD_REQUEST, "Missing recipient address");
    };

    let dispatcher = NotificationDispatcher::new(state.store(), state.mailer());
    match dispatcher
        .dispatch(template_type, &recipient, &variables)
        .await
    {
        Ok(()) => Json(json!({ "success": true })).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "send-email dispatch failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to send email")
        }
    }
}
