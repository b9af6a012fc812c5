//! Authentication extractor for admin.
//!
//! Every protected handler takes [`RequireAdminAuth`]. Extraction runs the
//! Session Gate's bootstrap resolution, so the identity record is re-checked
//! on each request.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::error::set_sentry_user;
use crate::models::IdentityRecord;
use crate::services::SessionGate;
use crate::state::AppState;

/// Extractor that requires an authenticated admin.
///
/// If the session is not authenticated, returns a redirect to the login page
/// for HTML requests, or 401 Unauthorized for API requests.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAdminAuth(admin): RequireAdminAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", admin.display_name)
/// }
/// ```
pub struct RequireAdminAuth(pub IdentityRecord);

/// Error returned when admin authentication is required but the session is not authenticated.
#[derive(Debug)]
pub enum AdminAuthRejection {
    /// Redirect to login page (for HTML requests).
    RedirectToLogin,
    /// Unauthorized response (for API requests).
    Unauthorized,
    /// The session store failed.
    SessionUnavailable,
}

impl IntoResponse for AdminAuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/auth/login").into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
            Self::SessionUnavailable => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}

impl FromRequestParts<AppState> for RequireAdminAuth {
    type Rejection = AdminAuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let refused = if parts.uri.path().starts_with("/api/") {
            AdminAuthRejection::Unauthorized
        } else {
            AdminAuthRejection::RedirectToLogin
        };

        // Set by SessionManagerLayer
        let Some(session) = parts.extensions.get::<Session>() else {
            return Err(refused);
        };

        let gate = SessionGate::new(session, state.provider(), state.store());
        let resolved = gate.resolve().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to resolve admin session");
            AdminAuthRejection::SessionUnavailable
        })?;

        let identity = resolved.admin().cloned().ok_or(refused)?;
        set_sentry_user(identity.id.as_str(), Some(identity.email.as_str()));
        Ok(Self(identity))
    }
}
