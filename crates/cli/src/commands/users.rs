//! Identity record commands.
//!
//! # Usage
//!
//! ```bash
//! # Grant console access
//! kinniku-cli users set-role --id <uid> --role admin
//! ```
//!
//! The uid is the identity provider's user id, which is also the id of the
//! user's document in the `users` collection.

use thiserror::Error;

use kinniku_admin::db::{IdentityRepository, RepositoryError};
use kinniku_core::{UserId, UserRole};

use super::{CommandError, document_store};

/// Errors that can occur during user operations.
#[derive(Debug, Error)]
pub enum UserCommandError {
    #[error(transparent)]
    Connect(#[from] CommandError),

    /// Invalid role.
    #[error("Invalid role: {0}. Valid roles: viewer, trainer, admin")]
    InvalidRole(String),

    /// No identity record with that id.
    #[error("No user with id {0}")]
    NotFound(String),

    #[error("Repository error: {0}")]
    Repository(RepositoryError),
}

/// Set the role on an existing identity record.
///
/// # Errors
///
/// Returns an error if the role is invalid, the record does not exist, or
/// the store fails.
pub async fn set_role(id: &str, role: &str) -> Result<(), UserCommandError> {
    let role: UserRole = role
        .parse()
        .map_err(|_| UserCommandError::InvalidRole(role.to_owned()))?;

    let store = document_store().await?;
    let record = IdentityRepository::new(&store)
        .set_role(&UserId::new(id), role)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => UserCommandError::NotFound(id.to_owned()),
            other => UserCommandError::Repository(other),
        })?;

    tracing::info!(
        "Role updated! ID: {}, Email: {}, Role: {}",
        record.id,
        record.email,
        record.role
    );
    Ok(())
}
