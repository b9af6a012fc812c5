//! API route handlers for admin.
//!
//! JSON endpoints. Unauthenticated requests get 401 instead of a redirect.

pub mod send_email;
pub mod uploads;
pub mod users;

use axum::Router;

use crate::state::AppState;

/// Build the complete API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(send_email::router())
        .merge(users::router())
        .merge(uploads::router())
}
