//! Notification Dispatcher: template-driven transactional email.
//!
//! Templates live in the `email_templates` collection, one per
//! [`TemplateType`]. Dispatching renders the stored subject and body with the
//! request's variables and hands the result to the mail transport. There is
//! no retry and no queue; a transport failure is returned to the caller.

pub mod defaults;
pub mod render;
pub mod variables;

pub use defaults::{DefaultTemplate, default_for};
pub use render::{Variables, render_tokens};

use chrono::Utc;
use thiserror::Error;

use kinniku_core::TemplateType;

use crate::db::{DocumentStore, EmailTemplateRepository, RepositoryError};
use crate::models::{EmailTemplate, RenderedMessage};
use crate::services::email::{MailTransport, OutboundMail, TransportError};

/// Errors that can occur while rendering or sending notifications.
#[derive(Debug, Error)]
pub enum NotificationError {
    /// No template is stored for the type.
    #[error("no template stored for {0}")]
    TemplateNotFound(TemplateType),

    /// The mail transport refused or failed to deliver the message.
    #[error("mail transport error: {0}")]
    Transport(#[from] TransportError),

    /// The template store could not be read or written.
    #[error("template store error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Renders stored templates and sends them.
pub struct NotificationDispatcher<'a> {
    templates: EmailTemplateRepository<'a>,
    transport: &'a dyn MailTransport,
}

impl<'a> NotificationDispatcher<'a> {
    /// Create a new dispatcher.
    #[must_use]
    pub const fn new(store: &'a dyn DocumentStore, transport: &'a dyn MailTransport) -> Self {
        Self {
            templates: EmailTemplateRepository::new(store),
            transport,
        }
    }

    /// Render the stored template for `template_type`.
    ///
    /// # Errors
    ///
    /// Returns `NotificationError::TemplateNotFound` if no template is stored.
    /// Returns `NotificationError::Repository` if the store cannot be read.
    pub async fn render(
        &self,
        template_type: TemplateType,
        variables: &Variables,
    ) -> Result<RenderedMessage, NotificationError> {
        let template = self
            .templates
            .get(template_type)
            .await?
            .ok_or(NotificationError::TemplateNotFound(template_type))?;

        Ok(RenderedMessage {
            subject: render_tokens(&template.subject, variables),
            body: render_tokens(&template.body, variables),
        })
    }

    /// Render and send one notification.
    ///
    /// # Errors
    ///
    /// Returns `NotificationError::TemplateNotFound` if no template is stored.
    /// Returns `NotificationError::Transport` if sending fails.
    pub async fn dispatch(
        &self,
        template_type: TemplateType,
        recipient: &str,
        variables: &Variables,
    ) -> Result<(), NotificationError> {
        let message = self.render(template_type, variables).await?;

        let mail = OutboundMail {
            to: recipient.to_string(),
            subject: message.subject,
            text: message.body,
        };

        if let Err(e) = self.transport.send(&mail).await {
            tracing::error!(
                template_type = %template_type,
                to = %recipient,
                error = %e,
                "Failed to send notification"
            );
            return Err(e.into());
        }

        tracing::info!(template_type = %template_type, to = %recipient, "Notification sent");
        Ok(())
    }

    /// Create or replace the template for a type.
    ///
    /// An existing template keeps its `createdAt`; display metadata comes
    /// from the built-in default for the type.
    ///
    /// # Errors
    ///
    /// Returns `NotificationError::Repository` if the store cannot be read or written.
    pub async fn upsert_template(
        &self,
        template_type: TemplateType,
        subject: &str,
        body: &str,
    ) -> Result<EmailTemplate, NotificationError> {
        let now = Utc::now();
        let created_at = self
            .templates
            .get(template_type)
            .await?
            .map_or(now, |existing| existing.created_at);
        let default = default_for(template_type);

        let template = EmailTemplate {
            template_type,
            name: default.name.to_string(),
            description: default.description.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
            variables: default.variable_names(),
            created_at,
            updated_at: now,
        };
        self.templates.put(&template).await?;

        tracing::info!(template_type = %template_type, "Template saved");
        Ok(template)
    }

    /// Edit subject and body of an existing template.
    ///
    /// # Errors
    ///
    /// Returns `NotificationError::TemplateNotFound` if no template is stored.
    /// Returns `NotificationError::Repository` if the store cannot be written.
    pub async fn update_template(
        &self,
        template_type: TemplateType,
        subject: &str,
        body: &str,
    ) -> Result<(), NotificationError> {
        match self
            .templates
            .update_content(template_type, subject, body, Utc::now())
            .await
        {
            Ok(()) => {
                tracing::info!(template_type = %template_type, "Template updated");
                Ok(())
            }
            Err(RepositoryError::NotFound) => {
                Err(NotificationError::TemplateNotFound(template_type))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Create every missing template from its built-in default.
    ///
    /// Existing templates are left untouched. Returns the types that were created.
    ///
    /// # Errors
    ///
    /// Returns `NotificationError::Repository` if the store cannot be read or written.
    pub async fn seed_defaults(&self) -> Result<Vec<TemplateType>, NotificationError> {
        let now = Utc::now();
        let mut created = Vec::new();

        for template_type in TemplateType::ALL {
            if self.templates.get(template_type).await?.is_some() {
                continue;
            }
            let template = default_for(template_type).to_template(template_type, now);
            self.templates.put(&template).await?;
            created.push(template_type);
        }

        tracing::info!(created = created.len(), "Default templates seeded");
        Ok(created)
    }

    /// Overwrite one template with its built-in default.
    ///
    /// # Errors
    ///
    /// Returns `NotificationError::Repository` if the store cannot be written.
    pub async fn seed_template(
        &self,
        template_type: TemplateType,
    ) -> Result<EmailTemplate, NotificationError> {
        let template = default_for(template_type).to_template(template_type, Utc::now());
        self.templates.put(&template).await?;

        tracing::info!(template_type = %template_type, "Template reset to default");
        Ok(template)
    }

    /// All stored templates, ordered by type.
    ///
    /// # Errors
    ///
    /// Returns `NotificationError::Repository` if the store cannot be read.
    pub async fn list_templates(&self) -> Result<Vec<EmailTemplate>, NotificationError> {
        Ok(self.templates.list().await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::db::MemoryDocumentStore;

    #[derive(Default)]
    struct RecordingTransport {
        sent: Mutex<Vec<OutboundMail>>,
        fail: bool,
    }

    #[async_trait]
    impl MailTransport for RecordingTransport {
        async fn send(&self, mail: &OutboundMail) -> Result<(), TransportError> {
            if self.fail {
                return Err(TransportError::Unavailable("relay down".to_string()));
            }
            self.sent.lock().unwrap().push(mail.clone());
            Ok(())
        }
    }

    fn vars(pairs: &[(&str, &str)]) -> Variables {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_render_missing_template() {
        let store = MemoryDocumentStore::new();
        let transport = RecordingTransport::default();
        let dispatcher = NotificationDispatcher::new(&store, &transport);

        let err = dispatcher
            .render(TemplateType::PaymentConfirmed, &Variables::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            NotificationError::TemplateNotFound(TemplateType::PaymentConfirmed)
        ));
    }

    #[tokio::test]
    async fn test_upsert_then_render_reflects_new_content() {
        let store = MemoryDocumentStore::new();
        let transport = RecordingTransport::default();
        let dispatcher = NotificationDispatcher::new(&store, &transport);

        dispatcher
            .upsert_template(
                TemplateType::ShippingComplete,
                "Shipped {{order_number}}",
                "Hello {{name}}, order {{order_number}}",
            )
            .await
            .unwrap();

        let message = dispatcher
            .render(TemplateType::ShippingComplete, &vars(&[("name", "Taro")]))
            .await
            .unwrap();
        assert_eq!(message.subject, "Shipped {{order_number}}");
        assert_eq!(message.body, "Hello Taro, order {{order_number}}");
    }

    #[tokio::test]
    async fn test_upsert_keeps_created_at() {
        let store = MemoryDocumentStore::new();
        let transport = RecordingTransport::default();
        let dispatcher = NotificationDispatcher::new(&store, &transport);

        let first = dispatcher
            .upsert_template(TemplateType::PaymentConfirmed, "a", "b")
            .await
            .unwrap();
        let second = dispatcher
            .upsert_template(TemplateType::PaymentConfirmed, "c", "d")
            .await
            .unwrap();

        assert_eq!(first.created_at, second.created_at);
        assert!(second.updated_at >= first.updated_at);
        assert_eq!(dispatcher.list_templates().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_requires_existing_template() {
        let store = MemoryDocumentStore::new();
        let transport = RecordingTransport::default();
        let dispatcher = NotificationDispatcher::new(&store, &transport);

        let err = dispatcher
            .update_template(TemplateType::OrderCompleteBank, "s", "b")
            .await
            .unwrap_err();
        assert!(matches!(err, NotificationError::TemplateNotFound(_)));

        dispatcher
            .seed_template(TemplateType::OrderCompleteBank)
            .await
            .unwrap();
        dispatcher
            .update_template(TemplateType::OrderCompleteBank, "s", "b")
            .await
            .unwrap();
        let message = dispatcher
            .render(TemplateType::OrderCompleteBank, &Variables::new())
            .await
            .unwrap();
        assert_eq!(message.subject, "s");
    }

    #[tokio::test]
    async fn test_seed_defaults_creates_only_missing() {
        let store = MemoryDocumentStore::new();
        let transport = RecordingTransport::default();
        let dispatcher = NotificationDispatcher::new(&store, &transport);

        dispatcher
            .upsert_template(TemplateType::PaymentConfirmed, "custom", "custom body")
            .await
            .unwrap();

        let created = dispatcher.seed_defaults().await.unwrap();
        assert_eq!(created.len(), 3);
        assert!(!created.contains(&TemplateType::PaymentConfirmed));

        let message = dispatcher
            .render(TemplateType::PaymentConfirmed, &Variables::new())
            .await
            .unwrap();
        assert_eq!(message.subject, "custom");
    }

    #[tokio::test]
    async fn test_dispatch_sends_rendered_message() {
        let store = MemoryDocumentStore::new();
        let transport = RecordingTransport::default();
        let dispatcher = NotificationDispatcher::new(&store, &transport);
        dispatcher.seed_defaults().await.unwrap();

        dispatcher
            .dispatch(
                TemplateType::PaymentConfirmed,
                "taro@example.com",
                &vars(&[("customer_name", "山田 太郎"), ("order_number", "KS-1")]),
            )
            .await
            .unwrap();

        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        let mail = sent.first().unwrap();
        assert_eq!(mail.to, "taro@example.com");
        assert!(mail.subject.contains("KS-1"));
        assert!(mail.text.starts_with("山田 太郎 様"));
    }

    #[tokio::test]
    async fn test_dispatch_surfaces_transport_failure() {
        let store = MemoryDocumentStore::new();
        let transport = RecordingTransport {
            fail: true,
            ..RecordingTransport::default()
        };
        let dispatcher = NotificationDispatcher::new(&store, &transport);
        dispatcher.seed_defaults().await.unwrap();

        let err = dispatcher
            .dispatch(TemplateType::ShippingComplete, "a@example.com", &Variables::new())
            .await
            .unwrap_err();
        assert!(matches!(err, NotificationError::Transport(_)));
    }
}
