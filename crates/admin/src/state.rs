//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::AdminConfig;
use crate::db::{self, DocumentStore, MemoryDocumentStore, PgDocumentStore};
use crate::services::{
    BlobStorage, EmailService, FirebaseAuthClient, FirebaseStorageClient, IdentityProvider,
    MailTransport, StorageError, TransportError,
};

/// Error that can occur while building application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("mail transport error: {0}")]
    Mail(#[from] TransportError),

    #[error("blob storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    store: Arc<dyn DocumentStore>,
    provider: Arc<dyn IdentityProvider>,
    mailer: Arc<dyn MailTransport>,
    storage: Option<Arc<dyn BlobStorage>>,
}

impl AppState {
    /// Build production state from configuration.
    ///
    /// Uses `PostgreSQL` when a database URL is configured and the in-memory
    /// document store otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the pool, HTTP clients or SMTP transport cannot be created.
    pub async fn new(config: AdminConfig) -> Result<Self, StateError> {
        let store: Arc<dyn DocumentStore> = match &config.database_url {
            Some(url) => {
                let pool = db::create_pool(url).await?;
                tracing::info!("Database pool created");
                Arc::new(PgDocumentStore::new(pool))
            }
            None => {
                tracing::warn!("No database URL configured, using in-memory document store");
                Arc::new(MemoryDocumentStore::new())
            }
        };

        let provider = Arc::new(FirebaseAuthClient::new(&config.firebase)?);
        let mailer = Arc::new(EmailService::new(&config.email)?);
        let storage = FirebaseStorageClient::new(&config.firebase)?
            .map(|client| Arc::new(client) as Arc<dyn BlobStorage>);
        if storage.is_none() {
            tracing::warn!("FIREBASE_STORAGE_BUCKET not set, image uploads disabled");
        }

        Ok(Self::from_parts(config, store, provider, mailer, storage))
    }

    /// Assemble state from already-built components.
    #[must_use]
    pub fn from_parts(
        config: AdminConfig,
        store: Arc<dyn DocumentStore>,
        provider: Arc<dyn IdentityProvider>,
        mailer: Arc<dyn MailTransport>,
        storage: Option<Arc<dyn BlobStorage>>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                provider,
                mailer,
                storage,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    /// Document store.
    #[must_use]
    pub fn store(&self) -> &dyn DocumentStore {
        self.inner.store.as_ref()
    }

    /// Identity provider.
    #[must_use]
    pub fn provider(&self) -> &dyn IdentityProvider {
        self.inner.provider.as_ref()
    }

    /// Outbound mail transport.
    #[must_use]
    pub fn mailer(&self) -> &dyn MailTransport {
        self.inner.mailer.as_ref()
    }

    /// Blob storage, when a bucket is configured.
    #[must_use]
    pub fn storage(&self) -> Option<&dyn BlobStorage> {
        self.inner.storage.as_deref()
    }
}
