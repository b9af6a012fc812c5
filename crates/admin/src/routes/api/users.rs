//! Identity record role management.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::patch,
};
use serde::Deserialize;
use tracing::instrument;

use kinniku_core::{UserId, UserRole};

use crate::{
    db::{IdentityRepository, RepositoryError},
    error::AppError,
    middleware::RequireAdminAuth,
    models::IdentityRecord,
    state::AppState,
};

/// Request body for a role change.
#[derive(Debug, Deserialize)]
pub struct RoleInput {
    pub role: String,
}

/// Build the users API router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/users/{id}/role", patch(set_role))
}

/// Change the role of an identity record.
///
/// PATCH /api/users/{id}/role
#[instrument(skip(admin, state))]
async fn set_role(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(id): Path<UserId>,
    Json(input): Json<RoleInput>,
) -> Result<Json<IdentityRecord>, AppError> {
    let role: UserRole = input.role.parse().map_err(AppError::BadRequest)?;

    // An admin cannot lock themselves out
    if id == admin.id && !role.is_admin() {
        return Err(AppError::BadRequest(
            "Cannot remove your own admin role".to_string(),
        ));
    }

    let record = IdentityRepository::new(state.store())
        .set_role(&id, role)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound(format!("user {id}")),
            other => AppError::Database(other),
        })?;

    tracing::info!(
        user_id = %record.id,
        role = %record.role,
        changed_by = %admin.id,
        "User role changed"
    );
    Ok(Json(record))
}
