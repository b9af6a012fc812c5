//! Email template commands.
//!
//! # Usage
//!
//! ```bash
//! # Create every missing template from its default
//! kinniku-cli templates seed
//!
//! # Reset one template to its default (overwrites)
//! kinniku-cli templates seed --only shipping_complete
//!
//! # List stored templates
//! kinniku-cli templates list
//! ```

use async_trait::async_trait;
use thiserror::Error;

use kinniku_admin::services::{
    MailTransport, NotificationDispatcher, NotificationError, OutboundMail, TransportError,
};
use kinniku_core::{TemplateType, UnknownTemplateType};

use super::{CommandError, document_store};

/// Errors that can occur during template operations.
#[derive(Debug, Error)]
pub enum TemplateCommandError {
    #[error(transparent)]
    Connect(#[from] CommandError),

    #[error(transparent)]
    UnknownType(#[from] UnknownTemplateType),

    #[error("Template error: {0}")]
    Notification(#[from] NotificationError),
}

/// Template maintenance never sends mail.
struct NoMail;

#[async_trait]
impl MailTransport for NoMail {
    async fn send(&self, _mail: &OutboundMail) -> Result<(), TransportError> {
        Err(TransportError::Unavailable(
            "mail is not configured for the CLI".to_string(),
        ))
    }
}

/// Seed templates: all missing ones, or overwrite a single type.
///
/// # Errors
///
/// Returns an error if the type is unknown or the store fails.
pub async fn seed(only: Option<&str>) -> Result<(), TemplateCommandError> {
    let template_type = only.map(str::parse::<TemplateType>).transpose()?;
    let store = document_store().await?;
    let dispatcher = NotificationDispatcher::new(&store, &NoMail);

    match template_type {
        Some(template_type) => {
            dispatcher.seed_template(template_type).await?;
            tracing::info!("Reset {} to its default", template_type);
        }
        None => {
            let created = dispatcher.seed_defaults().await?;
            if created.is_empty() {
                tracing::info!("All templates already exist; nothing to do");
            }
            for template_type in created {
                tracing::info!("Created {}", template_type);
            }
        }
    }
    Ok(())
}

/// List stored templates.
///
/// # Errors
///
/// Returns an error if the store cannot be read.
pub async fn list() -> Result<(), TemplateCommandError> {
    let store = document_store().await?;
    let dispatcher = NotificationDispatcher::new(&store, &NoMail);
    let templates = dispatcher.list_templates().await?;

    let missing: Vec<_> = TemplateType::ALL
        .into_iter()
        .filter(|t| !templates.iter().any(|stored| stored.template_type == *t))
        .collect();

    for template in &templates {
        tracing::info!(
            "{:<24} {}  (updated {})",
            template.template_type.as_str(),
            template.subject,
            template.updated_at.format("%Y-%m-%d %H:%M")
        );
    }
    for template_type in missing {
        tracing::warn!("{:<24} not created", template_type.as_str());
    }
    Ok(())
}
