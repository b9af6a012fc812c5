//! Authentication route handlers for admin.
//!
//! Email and password sign-in against the identity provider; only identity
//! records with the admin role get through.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::State,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, clear_sentry_user};
use crate::services::SessionGate;
use crate::state::AppState;

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginPageTemplate {
    pub error: Option<String>,
    pub email: String,
}

/// Login form input.
#[derive(Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for LoginInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginInput")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Build the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/login", get(login_page).post(login))
        .route("/auth/logout", post(logout))
}

/// Render the login page.
///
/// GET /auth/login
#[instrument(skip(state, session))]
async fn login_page(State(state): State<AppState>, session: Session) -> Result<Response, AppError> {
    let gate = SessionGate::new(&session, state.provider(), state.store());
    let current = gate.current().await?;

    if current.admin().is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    Ok(LoginPageTemplate {
        error: current.last_error,
        email: String::new(),
    }
    .into_response())
}

/// Sign in with email and password.
///
/// POST /auth/login
#[instrument(skip(state, session))]
async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(input): Form<LoginInput>,
) -> Result<Response, AppError> {
    let gate = SessionGate::new(&session, state.provider(), state.store());

    if gate.sign_in(input.email.trim(), &input.password).await {
        return Ok(Redirect::to("/").into_response());
    }

    let current = gate.current().await?;
    Ok(LoginPageTemplate {
        error: current.last_error,
        email: input.email,
    }
    .into_response())
}

/// Sign out and clear the session.
///
/// POST /auth/logout
#[instrument(skip(state, session))]
async fn logout(State(state): State<AppState>, session: Session) -> Result<Redirect, AppError> {
    let gate = SessionGate::new(&session, state.provider(), state.store());
    gate.sign_out().await?;
    clear_sentry_user();

    Ok(Redirect::to("/auth/login"))
}
