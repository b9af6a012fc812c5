//! Unified error handling for admin.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::{AuthError, NotificationError, OrderActionError, StorageError};

/// Application-level error type for the admin console.
#[derive(Debug, Error)]
pub enum AppError {
    /// Document store operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Notification could not be rendered or delivered.
    #[error("Notification error: {0}")]
    Notification(#[from] NotificationError),

    /// Blob storage upload failed.
    #[error("Storage error: {0}")]
    Storage(StorageError),

    /// Session could not be read or written.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<OrderActionError> for AppError {
    fn from(err: OrderActionError) -> Self {
        match err {
            OrderActionError::NotFound(id) => Self::NotFound(format!("order {id}")),
            OrderActionError::InvalidInput(msg) => Self::BadRequest(msg),
            OrderActionError::Notification(e) => Self::Notification(e),
            OrderActionError::Repository(e) => Self::Database(e),
        }
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::ProductNotFound => Self::NotFound("product".to_string()),
            StorageError::TooLarge { .. }
            | StorageError::UnsupportedType(_)
            | StorageError::TooManyImages { .. } => Self::BadRequest(err.to_string()),
            StorageError::Repository(e) => Self::Database(e),
            other => Self::Storage(other),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Lookup(e) => Self::Database(e),
            AuthError::Session(e) => Self::Session(e),
            other => Self::Unauthorized(other.user_message().to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log server errors with Sentry
        if matches!(
            self,
            Self::Database(_)
                | Self::Internal(_)
                | Self::Session(_)
                | Self::Notification(_)
                | Self::Storage(_)
        ) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Admin request error"
            );
        }

        let status = match &self {
            Self::Database(_) | Self::Internal(_) | Self::Session(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Notification(NotificationError::TemplateNotFound(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Notification(_) | Self::Storage(_) => StatusCode::BAD_GATEWAY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        };

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Database(_) | Self::Internal(_) | Self::Session(_) => {
                "Internal server error".to_string()
            }
            Self::Notification(_) => "Failed to send email".to_string(),
            Self::Storage(_) => "External service error".to_string(),
            _ => self.to_string(),
        };

        (status, message).into_response()
    }
}

/// Set the Sentry user context from an identity record.
pub fn set_sentry_user(user_id: &str, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}
