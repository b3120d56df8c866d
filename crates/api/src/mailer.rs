//! Seam to the email provider.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub reply_to: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EmailReceipt {
    pub id: Uuid,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MailError {
    #[error("mail provider rejected message: {0}")]
    Rejected(String),

    #[error("mail provider unavailable: {0}")]
    Unavailable(String),
}

/// Pluggable `send(message) -> receipt` capability. The provider's wire
/// protocol lives behind implementations of this trait.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: EmailMessage) -> Result<EmailReceipt, MailError>;
}

/// Writes messages to the log instead of delivering them (dev/test).
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: EmailMessage) -> Result<EmailReceipt, MailError> {
        let receipt = EmailReceipt { id: Uuid::now_v7() };
        tracing::info!(
            id = %receipt.id,
            to = %message.to,
            subject = %message.subject,
            "email accepted by log mailer"
        );
        Ok(receipt)
    }
}
