//! Firebase Authentication REST client.
//!
//! Uses the identity toolkit `accounts:signInWithPassword` endpoint:
//! `POST {endpoint}/v1/accounts:signInWithPassword?key={api_key}`.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use kinniku_core::UserId;

use super::error::ProviderError;
use super::provider::IdentityProvider;
use crate::config::FirebaseConfig;
use crate::models::ProviderSession;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignInRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    local_id: String,
    email: Option<String>,
    display_name: Option<String>,
    id_token: String,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Identity provider backed by Firebase Authentication.
#[derive(Clone)]
pub struct FirebaseAuthClient {
    client: reqwest::Client,
    api_key: SecretString,
    endpoint: String,
}

impl FirebaseAuthClient {
    /// Create a new client from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &FirebaseConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            endpoint: config.auth_endpoint.clone(),
        })
    }
}

#[async_trait]
impl IdentityProvider for FirebaseAuthClient {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<ProviderSession, ProviderError> {
        let url = format!(
            "{}/v1/accounts:signInWithPassword?key={}",
            self.endpoint,
            urlencoding::encode(self.api_key.expose_secret())
        );
        let response = self
            .client
            .post(&url)
            .json(&SignInRequest {
                email,
                password,
                return_secure_token: true,
            })
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Identity provider request failed");
                ProviderError::Unknown(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let code = response
                .json::<ErrorEnvelope>()
                .await
                .map(|envelope| envelope.error.message)
                .unwrap_or_else(|_| status.to_string());
            tracing::info!(status = %status, code = %code, "Identity provider refused sign-in");
            return Err(ProviderError::from_code(&code));
        }

        let body: SignInResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Unknown(format!("invalid sign-in response: {e}")))?;

        Ok(ProviderSession {
            uid: UserId::new(body.local_id),
            email: body.email,
            display_name: body.display_name.filter(|n| !n.is_empty()),
            id_token: body.id_token,
        })
    }
}
