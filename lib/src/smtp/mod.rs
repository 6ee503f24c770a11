pub mod client;
pub mod reply;

pub use client::SmtpClient;
pub use reply::Reply;

use crate::config::MailConfig;
use crate::email::{OutboundMessage, PdfAttachment};
use crate::Error;

/// Per-call mail submission facade: one TLS connection, one message,
/// QUIT, close. No pooling, no retry; retries belong to the caller.
#[derive(Clone)]
pub struct Mailer {
    config: MailConfig,
}

impl Mailer {
    pub fn new(config: MailConfig) -> Self {
        Self { config }
    }

    /// The configured account is both the authenticating user and the
    /// envelope sender.
    pub fn message(
        &self,
        to: impl Into<String>,
        subject: impl Into<String>,
        html: impl Into<String>,
        attachment: Option<PdfAttachment>,
    ) -> OutboundMessage {
        OutboundMessage {
            from: self.config.username.clone(),
            to: to.into(),
            subject: subject.into(),
            html: html.into(),
            attachment,
        }
    }

    pub async fn send(&self, message: &OutboundMessage) -> Result<(), Error> {
        log::info!(
            "sending mail to {} via {}:{} (attachment: {})",
            message.to,
            self.config.host,
            self.config.port,
            message.attachment.is_some()
        );

        let client = SmtpClient::connect(&self.config.host, self.config.port).await?;
        client
            .send(&self.config.username, &self.config.app_password, message)
            .await
    }
}
