//! Session-related types for admin authentication.
//!
//! Everything here lives in the in-memory session store only. Nothing is
//! written to the document store.

use std::fmt;

use serde::{Deserialize, Serialize};

use kinniku_core::UserId;

use super::identity::IdentityRecord;

/// Where a browser session stands in the sign-in lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Bootstrap in progress; the provider session has not been checked yet.
    #[default]
    Resolving,
    /// An admin identity is signed in.
    Authenticated,
    /// A principal signed in but is not allowed into the console.
    Rejected,
    /// Nobody is signed in.
    Unauthenticated,
}

/// Session-stored console state.
///
/// `status == Authenticated` always comes with an admin `identity`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AdminSession {
    pub status: SessionStatus,
    pub identity: Option<IdentityRecord>,
    /// Reason shown on the sign-in page after a failed attempt.
    pub last_error: Option<String>,
}

impl AdminSession {
    /// The session state after sign-out.
    #[must_use]
    pub const fn signed_out() -> Self {
        Self {
            status: SessionStatus::Unauthenticated,
            identity: None,
            last_error: None,
        }
    }

    /// Returns the identity only when the session is authenticated.
    #[must_use]
    pub fn admin(&self) -> Option<&IdentityRecord> {
        match self.status {
            SessionStatus::Authenticated => self.identity.as_ref().filter(|i| i.is_admin()),
            _ => None,
        }
    }
}

/// Credential issued by the identity provider for a signed-in principal.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSession {
    /// Provider uid; doubles as the identity record id.
    pub uid: UserId,
    pub email: Option<String>,
    pub display_name: Option<String>,
    /// Short-lived provider token for REST calls made on the principal's behalf.
    pub id_token: String,
}

impl fmt::Debug for ProviderSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSession")
            .field("uid", &self.uid)
            .field("email", &self.email)
            .field("display_name", &self.display_name)
            .field("id_token", &"[REDACTED]")
            .finish()
    }
}

/// Session keys for admin authentication data.
pub mod keys {
    /// Key for the console session state.
    pub const ADMIN_SESSION: &str = "admin_session";

    /// Key for the identity provider credential.
    pub const PROVIDER_SESSION: &str = "provider_session";
}
