//! Notification template repository.

use chrono::{DateTime, Utc};
use serde_json::json;

use kinniku_core::TemplateType;

use super::{DocumentStore, Query, RepositoryError, collections, to_fields};
use crate::models::EmailTemplate;

/// Repository for the `email_templates` collection.
///
/// Documents are keyed by the template type's wire value, so there is at
/// most one template per type.
pub struct EmailTemplateRepository<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> EmailTemplateRepository<'a> {
    /// Create a new template repository.
    #[must_use]
    pub const fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    /// Get the template for a type.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the store cannot be reached.
    /// Returns `RepositoryError::DataCorruption` if the stored template is malformed.
    pub async fn get(&self, template_type: TemplateType) -> Result<Option<EmailTemplate>, RepositoryError> {
        self.store
            .get_by_id(collections::EMAIL_TEMPLATES, template_type.as_str())
            .await?
            .map(|doc| doc.decode())
            .transpose()
    }

    /// List every stored template, ordered by type.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the store cannot be reached.
    /// Returns `RepositoryError::DataCorruption` if a stored template is malformed.
    pub async fn list(&self) -> Result<Vec<EmailTemplate>, RepositoryError> {
        let docs = self
            .store
            .query(collections::EMAIL_TEMPLATES, &Query::new())
            .await?;

        let mut templates = docs
            .iter()
            .map(super::Document::decode::<EmailTemplate>)
            .collect::<Result<Vec<_>, _>>()?;
        templates.sort_by_key(|t| t.template_type);
        Ok(templates)
    }

    /// Write a whole template, replacing any stored content.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the write fails.
    pub async fn put(&self, template: &EmailTemplate) -> Result<(), RepositoryError> {
        let fields = to_fields(template)?;
        self.store
            .upsert(
                collections::EMAIL_TEMPLATES,
                template.template_type.as_str(),
                fields,
            )
            .await
    }

    /// Replace subject and body of an existing template.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no template exists for the type.
    /// Returns `RepositoryError::Database` if the write fails.
    pub async fn update_content(
        &self,
        template_type: TemplateType,
        subject: &str,
        body: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        if self
            .store
            .get_by_id(collections::EMAIL_TEMPLATES, template_type.as_str())
            .await?
            .is_none()
        {
            return Err(RepositoryError::NotFound);
        }

        let fields = to_fields(&json!({
            "subject": subject,
            "body": body,
            "updatedAt": updated_at,
        }))?;
        self.store
            .upsert(collections::EMAIL_TEMPLATES, template_type.as_str(), fields)
            .await
    }
}
