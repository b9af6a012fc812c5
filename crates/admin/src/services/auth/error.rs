//! Admin authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Why a signed-in principal was refused a console session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RejectReason {
    /// No identity record exists for the principal.
    #[error("user record not found")]
    RecordMissing,

    /// The identity record's role is not `admin`.
    #[error("account does not have admin access")]
    NotAdmin,
}

impl RejectReason {
    /// Message shown on the sign-in page.
    #[must_use]
    pub const fn user_message(self) -> &'static str {
        match self {
            Self::RecordMissing => "User information could not be found.",
            Self::NotAdmin => "This account does not have administrator access.",
        }
    }
}

/// Sign-in failures reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// Unknown account or wrong password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The email address is malformed.
    #[error("invalid email address")]
    InvalidEmail,

    /// Too many attempts; the provider is throttling this account.
    #[error("too many sign-in attempts")]
    RateLimited,

    /// Anything else, including network failures.
    #[error("sign-in failed: {0}")]
    Unknown(String),
}

impl ProviderError {
    /// Classify a provider error code.
    ///
    /// Accepts both REST codes (`INVALID_PASSWORD`, optionally followed by
    /// ` : detail`) and SDK-style codes (`auth/wrong-password`).
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        let code = code.split(" : ").next().unwrap_or(code).trim();
        match code {
            "EMAIL_NOT_FOUND"
            | "INVALID_PASSWORD"
            | "INVALID_LOGIN_CREDENTIALS"
            | "auth/user-not-found"
            | "auth/wrong-password"
            | "auth/invalid-credential" => Self::InvalidCredentials,
            "INVALID_EMAIL" | "auth/invalid-email" => Self::InvalidEmail,
            "TOO_MANY_ATTEMPTS_TRY_LATER" | "auth/too-many-requests" => Self::RateLimited,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Message shown on the sign-in page.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "The email address or password is incorrect.",
            Self::InvalidEmail => "The email address is not valid.",
            Self::RateLimited => {
                "Too many sign-in attempts. Please wait a while and try again."
            }
            Self::Unknown(_) => "Sign-in failed.",
        }
    }
}

/// Errors that can occur during admin authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Definitive refusal; the provider session has been terminated.
    #[error("access rejected: {0}")]
    Rejected(RejectReason),

    /// Identity provider refused the credentials or could not be reached.
    #[error("identity provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The identity record could not be read.
    #[error("identity lookup failed: {0}")]
    Lookup(#[from] RepositoryError),

    /// The session store could not be read or written.
    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
}

impl AuthError {
    /// Message shown on the sign-in page.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::Rejected(reason) => reason.user_message(),
            Self::Provider(e) => e.user_message(),
            Self::Lookup(_) => "User information could not be loaded.",
            Self::Session(_) => "Sign-in failed.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rest_codes_are_classified() {
        assert_eq!(
            ProviderError::from_code("INVALID_PASSWORD"),
            ProviderError::InvalidCredentials
        );
        assert_eq!(
            ProviderError::from_code("EMAIL_NOT_FOUND"),
            ProviderError::InvalidCredentials
        );
        assert_eq!(
            ProviderError::from_code("INVALID_EMAIL"),
            ProviderError::InvalidEmail
        );
        assert_eq!(
            ProviderError::from_code(
                "TOO_MANY_ATTEMPTS_TRY_LATER : Access to this account has been temporarily disabled"
            ),
            ProviderError::RateLimited
        );
    }

    #[test]
    fn test_sdk_codes_are_classified() {
        assert_eq!(
            ProviderError::from_code("auth/wrong-password"),
            ProviderError::InvalidCredentials
        );
        assert_eq!(
            ProviderError::from_code("auth/too-many-requests"),
            ProviderError::RateLimited
        );
    }

    #[test]
    fn test_unrecognised_code_is_unknown() {
        assert_eq!(
            ProviderError::from_code("USER_DISABLED"),
            ProviderError::Unknown("USER_DISABLED".to_string())
        );
        assert_eq!(
            ProviderError::Unknown(String::new()).user_message(),
            "Sign-in failed."
        );
    }
}
