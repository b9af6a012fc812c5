//! Session Gate: role-gated sign-in for console operators.
//!
//! A browser session moves through four states:
//!
//! ```text
//!              bootstrap / sign-in
//!   ┌──────────────► Resolving ───────────────┐
//!   │                   │   │                  │
//!   │         admin     │   │ no principal     │ record missing,
//!   │         record    │   │                  │ not admin
//!   │                   ▼   ▼                  ▼
//!   │        Authenticated  Unauthenticated  Rejected
//!   │              │            ▲   │            │
//!   │              └─ sign-out ─┘   └── sign-in ─┴──┘
//! ```
//!
//! The same [`check_admin_access`] decides both at bootstrap ([`SessionGate::resolve`],
//! run on every protected page load) and after an explicit sign-in. Whenever a
//! principal is refused, the provider session is terminated before the state
//! settles, so there is never a provider session without an admitted identity.

mod error;
pub mod firebase;
mod provider;

pub use error::{AuthError, ProviderError, RejectReason};
pub use firebase::FirebaseAuthClient;
pub use provider::IdentityProvider;

use tower_sessions::Session;

use crate::db::{DocumentStore, IdentityRepository};
use crate::models::{AdminSession, IdentityRecord, ProviderSession, SessionStatus, session_keys};

/// Outcome of the admin check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    /// The record belongs to an admin.
    Admitted(IdentityRecord),
    /// The principal may not hold a console session.
    Rejected(RejectReason),
}

/// Decide whether a principal may hold a console session.
///
/// An empty display name on the record falls back to the one the provider
/// reported.
#[must_use]
pub fn check_admin_access(
    record: Option<IdentityRecord>,
    principal: &ProviderSession,
) -> AccessDecision {
    let Some(mut record) = record else {
        return AccessDecision::Rejected(RejectReason::RecordMissing);
    };

    if !record.is_admin() {
        return AccessDecision::Rejected(RejectReason::NotAdmin);
    }

    if record.display_name.trim().is_empty() {
        record.display_name = principal
            .display_name
            .clone()
            .unwrap_or_else(|| record.email.local_part().to_string());
    }

    AccessDecision::Admitted(record)
}

/// Session Gate bound to one browser session.
pub struct SessionGate<'a> {
    session: &'a Session,
    provider: &'a dyn IdentityProvider,
    identities: IdentityRepository<'a>,
}

impl<'a> SessionGate<'a> {
    /// Create a gate for the given browser session.
    #[must_use]
    pub const fn new(
        session: &'a Session,
        provider: &'a dyn IdentityProvider,
        store: &'a dyn DocumentStore,
    ) -> Self {
        Self {
            session,
            provider,
            identities: IdentityRepository::new(store),
        }
    }

    /// Current state, without contacting the provider or the store.
    ///
    /// A session that has never been resolved reports `Resolving`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Session` if the session store cannot be read.
    pub async fn current(&self) -> Result<AdminSession, AuthError> {
        Ok(self
            .session
            .get::<AdminSession>(session_keys::ADMIN_SESSION)
            .await?
            .unwrap_or_default())
    }

    /// The provider session attached to this browser session, if any.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Session` if the session store cannot be read.
    pub async fn provider_session(&self) -> Result<Option<ProviderSession>, AuthError> {
        Ok(self
            .session
            .get::<ProviderSession>(session_keys::PROVIDER_SESSION)
            .await?)
    }

    /// Bootstrap resolution, run on every protected page load.
    ///
    /// Re-reads the identity record each time so a revoked role takes effect
    /// on the next request.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Session` if the session store cannot be read or
    /// written. Refusals are not errors; they are reflected in the returned state.
    pub async fn resolve(&self) -> Result<AdminSession, AuthError> {
        let previous = self.current().await?;

        let Some(principal) = self.provider_session().await? else {
            let state = AdminSession {
                status: SessionStatus::Unauthenticated,
                identity: None,
                last_error: previous.last_error,
            };
            self.store_state(&state).await?;
            return Ok(state);
        };

        let state = match self.admit(&principal).await {
            Ok(identity) => AdminSession {
                status: SessionStatus::Authenticated,
                identity: Some(identity),
                last_error: None,
            },
            Err(e) => self.refuse(&principal, &e).await?,
        };

        self.store_state(&state).await?;
        Ok(state)
    }

    /// Sign in with email and password.
    ///
    /// Returns `true` only when the session ends up authenticated. On failure
    /// `last_error` carries the reason.
    pub async fn sign_in(&self, email: &str, password: &str) -> bool {
        match self.try_sign_in(email, password).await {
            Ok(_) => true,
            Err(e) => {
                tracing::info!(error = %e, "Admin sign-in refused");
                false
            }
        }
    }

    /// Sign in with email and password, returning the typed failure.
    ///
    /// # Errors
    ///
    /// - `AuthError::Provider` if the provider refuses the credentials
    /// - `AuthError::Rejected` if the principal is not an admin
    /// - `AuthError::Lookup` if the identity record cannot be read
    /// - `AuthError::Session` if the session store fails
    pub async fn try_sign_in(&self, email: &str, password: &str) -> Result<IdentityRecord, AuthError> {
        self.store_state(&AdminSession::default()).await?;

        let principal = match self.provider.sign_in_with_password(email, password).await {
            Ok(principal) => principal,
            Err(e) => {
                // A failed attempt never leaves an earlier credential behind
                self.terminate_provider_session().await?;
                let state = AdminSession {
                    status: SessionStatus::Unauthenticated,
                    identity: None,
                    last_error: Some(e.user_message().to_string()),
                };
                self.store_state(&state).await?;
                return Err(e.into());
            }
        };

        // New credential, new session id
        self.session.cycle_id().await?;
        self.session
            .insert(session_keys::PROVIDER_SESSION, &principal)
            .await?;

        match self.admit(&principal).await {
            Ok(identity) => {
                let state = AdminSession {
                    status: SessionStatus::Authenticated,
                    identity: Some(identity.clone()),
                    last_error: None,
                };
                self.store_state(&state).await?;
                tracing::info!(user_id = %identity.id, "Admin signed in");
                Ok(identity)
            }
            Err(e) => {
                let state = self.refuse(&principal, &e).await?;
                self.store_state(&state).await?;
                Err(e)
            }
        }
    }

    /// Sign out. Always leaves the session unauthenticated with no identity.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Session` if the session store cannot be written.
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        if let Err(e) = self.terminate_provider_session().await {
            tracing::warn!(error = %e, "Failed to remove provider session");
        }
        self.store_state(&AdminSession::signed_out()).await?;
        self.session.cycle_id().await?;
        Ok(())
    }

    // =========================================================================
    // Internals
    // =========================================================================

    async fn admit(&self, principal: &ProviderSession) -> Result<IdentityRecord, AuthError> {
        let record = self
            .identities
            .get_for_principal(&principal.uid, principal.email.as_deref())
            .await?;
        match check_admin_access(record, principal) {
            AccessDecision::Admitted(identity) => Ok(identity),
            AccessDecision::Rejected(reason) => Err(AuthError::Rejected(reason)),
        }
    }

    /// Terminate the provider session and build the settled state for a refusal.
    async fn refuse(
        &self,
        principal: &ProviderSession,
        error: &AuthError,
    ) -> Result<AdminSession, AuthError> {
        self.terminate_provider_session().await?;

        let status = match error {
            AuthError::Rejected(_) => {
                tracing::warn!(user_id = %principal.uid, error = %error, "Console access rejected");
                SessionStatus::Rejected
            }
            _ => {
                tracing::error!(user_id = %principal.uid, error = %error, "Identity lookup failed");
                SessionStatus::Unauthenticated
            }
        };

        Ok(AdminSession {
            status,
            identity: None,
            last_error: Some(error.user_message().to_string()),
        })
    }

    async fn terminate_provider_session(&self) -> Result<(), AuthError> {
        self.session
            .remove::<ProviderSession>(session_keys::PROVIDER_SESSION)
            .await?;
        Ok(())
    }

    async fn store_state(&self, state: &AdminSession) -> Result<(), AuthError> {
        self.session
            .insert(session_keys::ADMIN_SESSION, state)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use serde_json::json;
    use tower_sessions::MemoryStore;

    use kinniku_core::{Email, UserId, UserRole};

    use super::*;
    use crate::db::{MemoryDocumentStore, collections, to_fields};

    struct StaticProvider(Result<ProviderSession, ProviderError>);

    #[async_trait]
    impl IdentityProvider for StaticProvider {
        async fn sign_in_with_password(
            &self,
            _email: &str,
            _password: &str,
        ) -> Result<ProviderSession, ProviderError> {
            self.0.clone()
        }
    }

    fn principal(uid: &str) -> ProviderSession {
        ProviderSession {
            uid: UserId::new(uid),
            email: Some(format!("{uid}@example.com")),
            display_name: Some("Provider Name".to_string()),
            id_token: "token".to_string(),
        }
    }

    fn record(role: UserRole, display_name: &str) -> IdentityRecord {
        IdentityRecord {
            id: UserId::new("u1"),
            email: Email::parse("u1@example.com").unwrap(),
            display_name: display_name.to_string(),
            role,
        }
    }

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    async fn store_with_user(uid: &str, role: &str) -> MemoryDocumentStore {
        let store = MemoryDocumentStore::new();
        store
            .upsert(
                collections::USERS,
                uid,
                to_fields(&json!({
                    "email": format!("{uid}@example.com"),
                    "displayName": "Record Name",
                    "role": role,
                }))
                .unwrap(),
            )
            .await
            .unwrap();
        store
    }

    #[test]
    fn test_check_admin_access_decisions() {
        let p = principal("u1");
        assert_eq!(
            check_admin_access(None, &p),
            AccessDecision::Rejected(RejectReason::RecordMissing)
        );
        assert_eq!(
            check_admin_access(Some(record(UserRole::Trainer, "T")), &p),
            AccessDecision::Rejected(RejectReason::NotAdmin)
        );
        assert!(matches!(
            check_admin_access(Some(record(UserRole::Admin, "A")), &p),
            AccessDecision::Admitted(r) if r.display_name == "A"
        ));
    }

    #[test]
    fn test_check_admin_access_display_name_fallback() {
        let decision = check_admin_access(Some(record(UserRole::Admin, "")), &principal("u1"));
        assert!(matches!(
            decision,
            AccessDecision::Admitted(r) if r.display_name == "Provider Name"
        ));
    }

    #[tokio::test]
    async fn test_sign_in_admin() {
        let store = store_with_user("u1", "admin").await;
        let provider = StaticProvider(Ok(principal("u1")));
        let session = session();
        let gate = SessionGate::new(&session, &provider, &store);

        assert!(gate.sign_in("u1@example.com", "pw").await);

        let state = gate.current().await.unwrap();
        assert_eq!(state.status, SessionStatus::Authenticated);
        assert_eq!(state.identity.unwrap().display_name, "Record Name");
        assert!(gate.provider_session().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_sign_in_non_admin_terminates_provider_session() {
        let store = store_with_user("u1", "viewer").await;
        let provider = StaticProvider(Ok(principal("u1")));
        let session = session();
        let gate = SessionGate::new(&session, &provider, &store);

        assert!(!gate.sign_in("u1@example.com", "pw").await);

        let state = gate.current().await.unwrap();
        assert_eq!(state.status, SessionStatus::Rejected);
        assert!(state.identity.is_none());
        assert_eq!(
            state.last_error.as_deref(),
            Some(RejectReason::NotAdmin.user_message())
        );
        assert!(gate.provider_session().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_provider_failure_sets_last_error() {
        let store = MemoryDocumentStore::new();
        let provider = StaticProvider(Err(ProviderError::RateLimited));
        let session = session();
        let gate = SessionGate::new(&session, &provider, &store);

        let err = gate.try_sign_in("u1@example.com", "pw").await.unwrap_err();
        assert!(matches!(err, AuthError::Provider(ProviderError::RateLimited)));

        let state = gate.current().await.unwrap();
        assert_eq!(state.status, SessionStatus::Unauthenticated);
        assert_eq!(
            state.last_error.as_deref(),
            Some(ProviderError::RateLimited.user_message())
        );
    }

    #[tokio::test]
    async fn test_sign_in_admin_record_without_email_uses_provider_email() {
        let store = MemoryDocumentStore::new();
        store
            .upsert(
                collections::USERS,
                "u1",
                to_fields(&json!({"displayName": "Admin", "role": "admin"})).unwrap(),
            )
            .await
            .unwrap();
        let provider = StaticProvider(Ok(principal("u1")));
        let session = session();
        let gate = SessionGate::new(&session, &provider, &store);

        assert!(gate.sign_in("u1@example.com", "pw").await);

        let identity = gate.current().await.unwrap().identity.unwrap();
        assert_eq!(identity.email.as_str(), "u1@example.com");
        assert_eq!(identity.display_name, "Admin");
    }

    #[tokio::test]
    async fn test_sign_in_record_without_any_email_is_rejected() {
        let store = MemoryDocumentStore::new();
        store
            .upsert(
                collections::USERS,
                "u1",
                to_fields(&json!({"role": "admin"})).unwrap(),
            )
            .await
            .unwrap();
        let provider = StaticProvider(Ok(ProviderSession {
            email: None,
            ..principal("u1")
        }));
        let session = session();
        let gate = SessionGate::new(&session, &provider, &store);

        assert!(!gate.sign_in("u1@example.com", "pw").await);

        let state = gate.current().await.unwrap();
        assert_eq!(state.status, SessionStatus::Rejected);
        assert_eq!(
            state.last_error.as_deref(),
            Some(RejectReason::RecordMissing.user_message())
        );
        assert!(gate.provider_session().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failed_sign_in_drops_earlier_credential() {
        let store = store_with_user("u1", "admin").await;
        let session = session();

        let accepting = StaticProvider(Ok(principal("u1")));
        assert!(
            SessionGate::new(&session, &accepting, &store)
                .sign_in("u1@example.com", "pw")
                .await
        );

        let refusing = StaticProvider(Err(ProviderError::InvalidCredentials));
        let gate = SessionGate::new(&session, &refusing, &store);
        assert!(!gate.sign_in("u1@example.com", "wrong").await);
        assert!(gate.provider_session().await.unwrap().is_none());

        let state = gate.resolve().await.unwrap();
        assert_eq!(state.status, SessionStatus::Unauthenticated);
        assert!(state.identity.is_none());
        assert_eq!(
            state.last_error.as_deref(),
            Some(ProviderError::InvalidCredentials.user_message())
        );
    }

    #[tokio::test]
    async fn test_resolve_without_principal_keeps_last_error() {
        let store = store_with_user("u1", "viewer").await;
        let provider = StaticProvider(Ok(principal("u1")));
        let session = session();
        let gate = SessionGate::new(&session, &provider, &store);

        assert!(!gate.sign_in("u1@example.com", "pw").await);
        let state = gate.resolve().await.unwrap();

        assert_eq!(state.status, SessionStatus::Unauthenticated);
        assert!(state.last_error.is_some());
    }

    #[tokio::test]
    async fn test_resolve_picks_up_role_revocation() {
        let store = store_with_user("u1", "admin").await;
        let provider = StaticProvider(Ok(principal("u1")));
        let session = session();
        let gate = SessionGate::new(&session, &provider, &store);
        assert!(gate.sign_in("u1@example.com", "pw").await);

        IdentityRepository::new(&store)
            .set_role(&UserId::new("u1"), UserRole::Viewer)
            .await
            .unwrap();

        let state = gate.resolve().await.unwrap();
        assert_eq!(state.status, SessionStatus::Rejected);
        assert!(gate.provider_session().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sign_out_clears_everything() {
        let store = store_with_user("u1", "admin").await;
        let provider = StaticProvider(Ok(principal("u1")));
        let session = session();
        let gate = SessionGate::new(&session, &provider, &store);
        assert!(gate.sign_in("u1@example.com", "pw").await);

        gate.sign_out().await.unwrap();

        let state = gate.current().await.unwrap();
        assert_eq!(state, AdminSession::signed_out());
        assert!(gate.provider_session().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sign_out_when_never_signed_in() {
        let store = MemoryDocumentStore::new();
        let provider = StaticProvider(Err(ProviderError::InvalidCredentials));
        let session = session();
        let gate = SessionGate::new(&session, &provider, &store);

        gate.sign_out().await.unwrap();
        assert_eq!(gate.current().await.unwrap(), AdminSession::signed_out());
    }
}
