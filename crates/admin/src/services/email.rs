//! Outbound mail delivery.
//!
//! Uses SMTP via lettre. Notification bodies are plain text; templating
//! happens in the dispatcher before a message reaches the transport.

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::EmailConfig;

/// A rendered message ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMail {
    pub to: String,
    pub subject: String,
    pub text: String,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum TransportError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// The transport is not accepting mail.
    #[error("Mail transport unavailable: {0}")]
    Unavailable(String),
}

/// Something that can deliver an [`OutboundMail`].
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Deliver one message. No retry is attempted.
    async fn send(&self, mail: &OutboundMail) -> Result<(), TransportError>;
}

/// SMTP mail transport.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the relay cannot be configured or the sender address
    /// is invalid.
    pub fn new(config: &EmailConfig) -> Result<Self, TransportError> {
        let address = config
            .from_address
            .parse()
            .map_err(|_| TransportError::InvalidAddress(config.from_address.clone()))?;

        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from: Mailbox::new(Some(config.from_name.clone()), address),
        })
    }
}

#[async_trait]
impl MailTransport for EmailService {
    async fn send(&self, mail: &OutboundMail) -> Result<(), TransportError> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(mail
                .to
                .parse()
                .map_err(|_| TransportError::InvalidAddress(mail.to.clone()))?)
            .subject(&mail.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(mail.text.clone())?;

        self.mailer.send(message).await?;

        tracing::info!(to = %mail.to, subject = %mail.subject, "Email sent successfully");
        Ok(())
    }
}
