//! Identity provider boundary.

use async_trait::async_trait;

use super::error::ProviderError;
use crate::models::ProviderSession;

/// Password sign-in against the managed identity provider.
///
/// Checking and terminating the provider session are handled by the
/// session layer; the provider is only contacted to exchange credentials.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Exchange an email and password for a provider session.
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<ProviderSession, ProviderError>;
}
