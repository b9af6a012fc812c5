//! Notification template domain type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use kinniku_core::TemplateType;

/// A stored notification template, one per [`TemplateType`].
///
/// Stored in the `email_templates` collection under the type's wire value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailTemplate {
    #[serde(rename = "type")]
    pub template_type: TemplateType,
    /// Display name on the management screen.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Subject line with `{{name}}` tokens.
    pub subject: String,
    /// Plain-text body with `{{name}}` tokens.
    pub body: String,
    /// Declared token names. Informational only; rendering does not check them.
    #[serde(default)]
    pub variables: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A rendered subject/body pair ready for sending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub subject: String,
    pub body: String,
}
