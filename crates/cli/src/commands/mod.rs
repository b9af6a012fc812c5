//! CLI command implementations.

pub mod migrate;
pub mod templates;
pub mod users;

use kinniku_admin::config::database_url_from_env;
use kinniku_admin::db::{self, PgDocumentStore};
use thiserror::Error;

/// Errors shared by the commands.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Connect to the admin database named by `ADMIN_DATABASE_URL` or `DATABASE_URL`.
///
/// # Errors
///
/// Returns an error if neither variable is set or the connection fails.
pub async fn connect() -> Result<sqlx::PgPool, CommandError> {
    dotenvy::dotenv().ok();

    let database_url =
        database_url_from_env().ok_or(CommandError::MissingEnvVar("ADMIN_DATABASE_URL"))?;

    tracing::info!("Connecting to admin database...");
    Ok(db::create_pool(&database_url).await?)
}

/// Document store over the admin database.
///
/// # Errors
///
/// Returns an error if the database cannot be reached.
pub async fn document_store() -> Result<PgDocumentStore, CommandError> {
    Ok(PgDocumentStore::new(connect().await?))
}
