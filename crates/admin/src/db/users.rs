//! Identity record repository.
//!
//! Reads and updates documents in the `users` collection. The mobile app
//! owns these documents; the console reads them for the admin check and only
//! ever writes the `role` field.

use chrono::Utc;
use serde_json::{Value, json};

use kinniku_core::{Email, UserId, UserRole};

use super::{Document, DocumentStore, RepositoryError, collections, to_fields};
use crate::models::IdentityRecord;

impl TryFrom<Document> for IdentityRecord {
    type Error = RepositoryError;

    fn try_from(doc: Document) -> Result<Self, Self::Error> {
        decode_identity(doc, None)
    }
}

/// Decode an identity record, taking the email from `fallback_email` when the
/// record has no usable one.
fn decode_identity(
    doc: Document,
    fallback_email: Option<&str>,
) -> Result<IdentityRecord, RepositoryError> {
    let email = doc
        .fields
        .get("email")
        .and_then(Value::as_str)
        .and_then(|e| Email::parse(e).ok())
        .or_else(|| fallback_email.and_then(|e| Email::parse(e).ok()))
        .ok_or_else(|| {
            RepositoryError::DataCorruption(format!(
                "identity record {} has no usable email",
                doc.id
            ))
        })?;

    let display_name = doc
        .fields
        .get("displayName")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    // Unknown or missing roles read as viewer so a bad record never grants access
    let role = UserRole::from_claim(doc.fields.get("role").and_then(Value::as_str));

    Ok(IdentityRecord {
        id: UserId::new(doc.id),
        email,
        display_name,
        role,
    })
}

/// Repository for identity records.
pub struct IdentityRepository<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> IdentityRepository<'a> {
    /// Create a new identity repository.
    #[must_use]
    pub const fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    /// Get an identity record by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the store cannot be reached.
    /// Returns `RepositoryError::DataCorruption` if the record is malformed.
    pub async fn get_by_id(&self, id: &UserId) -> Result<Option<IdentityRecord>, RepositoryError> {
        self.store
            .get_by_id(collections::USERS, id.as_str())
            .await?
            .map(TryInto::try_into)
            .transpose()
    }

    /// Get the identity record of a signed-in principal.
    ///
    /// A record without a usable email takes the one the provider reported.
    /// A record that still has none reads as missing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the store cannot be reached.
    pub async fn get_for_principal(
        &self,
        id: &UserId,
        provider_email: Option<&str>,
    ) -> Result<Option<IdentityRecord>, RepositoryError> {
        let Some(doc) = self.store.get_by_id(collections::USERS, id.as_str()).await? else {
            return Ok(None);
        };

        match decode_identity(doc, provider_email) {
            Ok(record) => Ok(Some(record)),
            Err(RepositoryError::DataCorruption(reason)) => {
                tracing::warn!(user_id = %id, %reason, "Identity record unusable");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Change the role of an existing identity record.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no record has this id.
    /// Returns `RepositoryError::Database` if the write fails.
    pub async fn set_role(
        &self,
        id: &UserId,
        role: UserRole,
    ) -> Result<IdentityRecord, RepositoryError> {
        let mut record = self.get_by_id(id).await?.ok_or(RepositoryError::NotFound)?;

        let fields = to_fields(&json!({
            "role": role.as_str(),
            "updatedAt": Utc::now(),
        }))?;
        self.store
            .upsert(collections::USERS, id.as_str(), fields)
            .await?;

        record.role = role;
        Ok(record)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::MemoryDocumentStore;

    async fn store_with(fields: Value) -> MemoryDocumentStore {
        let store = MemoryDocumentStore::new();
        store
            .upsert(collections::USERS, "u1", to_fields(&fields).unwrap())
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_unknown_role_reads_as_viewer() {
        let store = store_with(json!({"email": "a@example.com", "role": "superuser"})).await;
        let record = IdentityRepository::new(&store)
            .get_by_id(&UserId::new("u1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.role, UserRole::Viewer);
        assert_eq!(record.display_name, "");
    }

    #[tokio::test]
    async fn test_missing_email_is_corruption() {
        let store = store_with(json!({"role": "admin"})).await;
        let result = IdentityRepository::new(&store)
            .get_by_id(&UserId::new("u1"))
            .await;
        assert!(matches!(result, Err(RepositoryError::DataCorruption(_))));
    }

    #[tokio::test]
    async fn test_principal_lookup_takes_provider_email() {
        let store = store_with(json!({"displayName": "Admin", "role": "admin"})).await;
        let record = IdentityRepository::new(&store)
            .get_for_principal(&UserId::new("u1"), Some("admin@example.com"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.email.as_str(), "admin@example.com");
        assert_eq!(record.role, UserRole::Admin);
    }

    #[tokio::test]
    async fn test_principal_lookup_without_any_email_reads_as_missing() {
        let store = store_with(json!({"role": "admin"})).await;
        let repo = IdentityRepository::new(&store);
        assert!(
            repo.get_for_principal(&UserId::new("u1"), None)
                .await
                .unwrap()
                .is_none()
        );
        assert!(
            repo.get_for_principal(&UserId::new("u1"), Some("not-an-email"))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_set_role_updates_record() {
        let store = store_with(json!({
            "email": "a@example.com",
            "displayName": "Aiko",
            "role": "viewer",
        }))
        .await;
        let repo = IdentityRepository::new(&store);

        let updated = repo
            .set_role(&UserId::new("u1"), UserRole::Trainer)
            .await
            .unwrap();
        assert_eq!(updated.role, UserRole::Trainer);

        let reread = repo.get_by_id(&UserId::new("u1")).await.unwrap().unwrap();
        assert_eq!(reread.role, UserRole::Trainer);
        assert_eq!(reread.display_name, "Aiko");
    }

    #[tokio::test]
    async fn test_set_role_on_missing_record() {
        let store = MemoryDocumentStore::new();
        let result = IdentityRepository::new(&store)
            .set_role(&UserId::new("ghost"), UserRole::Admin)
            .await;
        assert!(matches!(result, Err(RepositoryError::NotFound)));
    }
}
